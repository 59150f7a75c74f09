//! Subscription status and checkout

use tracing::info;

use taskman_protocol::{SubscribeRequest, Subscription};

use crate::client::ApiRequest;
use crate::error::{Result, TaskmanError};
use crate::session::Session;

pub struct BillingService<'a> {
    session: &'a Session,
}

impl<'a> BillingService<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Current subscription; the backend starts a trial on first access
    pub async fn status(&self) -> Result<Subscription> {
        self.session
            .authenticated_fetch(ApiRequest::get("/api/billing/status/"))
            .await?
            .into_result()
    }

    /// Purchase a plan
    ///
    /// A declined card surfaces as a payment error, an unknown plan as an
    /// API error carrying the field message.
    pub async fn subscribe(&self, request: &SubscribeRequest) -> Result<Subscription> {
        if !request.plan.is_purchasable() {
            return Err(TaskmanError::invalid_input(format!(
                "The {} plan cannot be purchased",
                request.plan
            )));
        }
        let card_number: String = request
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let body = SubscribeRequest {
            card_number,
            ..request.clone()
        };

        let subscription: Subscription = self
            .session
            .authenticated_fetch(ApiRequest::post("/api/billing/subscribe/").json(&body)?)
            .await?
            .into_result()?;

        info!(plan = %subscription.plan, "subscription purchased");
        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::tests::mocks::logged_in_session;
    use serde_json::json;
    use taskman_protocol::Plan;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn checkout(plan: Plan) -> SubscribeRequest {
        SubscribeRequest {
            plan,
            card_number: "4242 4242 4242 4242".to_string(),
            expiry: "01/28".to_string(),
            cvc: "123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_subscribe_strips_card_spaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/billing/subscribe/"))
            .and(body_json(json!({
                "plan": "monthly",
                "card_number": "4242424242424242",
                "expiry": "01/28",
                "cvc": "123"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "plan": "monthly",
                "status": "active",
                "start_date": "2025-03-10",
                "end_date": "2025-04-09",
                "transaction_id": "FAKE-1741600000",
                "days_remaining": 30
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = logged_in_session(&server);
        let subscription = BillingService::new(&session)
            .subscribe(&checkout(Plan::Monthly))
            .await
            .unwrap();
        assert!(subscription.is_active());
        assert_eq!(subscription.days_remaining, 30);
    }

    #[tokio::test]
    async fn test_declined_card() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/billing/subscribe/"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({"detail": "Card declined"})))
            .mount(&server)
            .await;

        let session = logged_in_session(&server);
        let err = BillingService::new(&session)
            .subscribe(&checkout(Plan::Yearly))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PaymentDeclined);
    }

    #[tokio::test]
    async fn test_trial_not_purchasable() {
        let server = MockServer::start().await;
        let session = logged_in_session(&server);
        let err = BillingService::new(&session)
            .subscribe(&checkout(Plan::Trial))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
