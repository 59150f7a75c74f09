//! Dashboard statistics

use taskman_protocol::{DashboardStats, Period};

use crate::client::ApiRequest;
use crate::error::Result;
use crate::session::Session;

pub struct DashboardService<'a> {
    session: &'a Session,
}

impl<'a> DashboardService<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Counts over tasks created in `period`, ending today
    pub async fn stats(&self, period: Period) -> Result<DashboardStats> {
        let request = ApiRequest::get("/api/dashboard/").query("period", period);
        self.session
            .authenticated_fetch(request)
            .await?
            .into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mocks::logged_in_session;
    use serde_json::json;
    use taskman_protocol::{Plan, SubscriptionStatus};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_stats_for_week() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dashboard/"))
            .and(query_param("period", "week"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_tasks": 4,
                "completed_tasks": 3,
                "pending_tasks": 1,
                "completion_rate": 75,
                "tasks_by_category": {"Work": 3, "Uncategorized": 1},
                "tasks_by_date": [{"date": "2025-03-10", "total": 4, "completed": 3}],
                "trial_days_remaining": 9,
                "subscription_plan": "trial",
                "subscription_status": "active"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = logged_in_session(&server);
        let stats = DashboardService::new(&session)
            .stats(Period::Week)
            .await
            .unwrap();

        assert_eq!(stats.completion_rate, 75);
        assert_eq!(stats.tasks_by_category.get("Work"), Some(&3));
        assert_eq!(stats.subscription_plan, Plan::Trial);
        assert_eq!(stats.subscription_status, SubscriptionStatus::Active);
    }
}
