use console::{strip_ansi_codes, Term};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

use taskman_protocol::{Task, TaskLabel, TaskTemplate};

use crate::error::Result;

/// Terminal output helpers
pub struct UI {
    term: Term,
}

impl UI {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    /// Helper method to conditionally apply color based on terminal support
    fn colorize<F>(&self, text: &str, color_fn: F) -> String
    where
        F: FnOnce(&str) -> String,
    {
        if self.supports_color() {
            color_fn(text)
        } else {
            text.to_string()
        }
    }

    /// Print a success message (color only if supported)
    pub fn success(&self, message: &str) {
        let output = self.colorize(message, |m| m.green().bold().to_string());
        println!("{}", output);
    }

    /// Print an error message (color only if supported)
    pub fn error(&self, message: &str) {
        let output = self.colorize(message, |m| m.red().bold().to_string());
        eprintln!("{}", output);
    }

    /// Print a warning message (color only if supported)
    pub fn warning(&self, message: &str) {
        let output = self.colorize(message, |m| m.yellow().bold().to_string());
        println!("{}", output);
    }

    /// Print an info message (color only if supported)
    pub fn info(&self, message: &str) {
        let output = self.colorize(message, |m| m.blue().bold().to_string());
        println!("{}", output);
    }

    /// Format authentication status with appropriate color (if supported)
    pub fn format_auth_status(&self, authenticated: bool, expired: bool) -> String {
        let text = if authenticated {
            "Authenticated"
        } else if expired {
            "Token expired"
        } else {
            "Not authenticated"
        };

        if self.supports_color() {
            if authenticated {
                text.green().to_string()
            } else if expired {
                text.yellow().to_string()
            } else {
                text.red().to_string()
            }
        } else {
            text.to_string()
        }
    }

    pub fn format_label(&self, label: TaskLabel) -> String {
        let text = label.as_str();
        if !self.supports_color() {
            return text.to_string();
        }
        match label {
            TaskLabel::None => text.dimmed().to_string(),
            TaskLabel::Yellow => text.yellow().to_string(),
            TaskLabel::Green => text.green().to_string(),
            TaskLabel::Blue => text.blue().to_string(),
            TaskLabel::Red => text.red().to_string(),
        }
    }

    /// Format optional field with fallback for missing data
    pub fn format_field(&self, value: Option<String>) -> String {
        value
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "-".to_string())
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        let term_width = self.width();
        let title_len = title.width() + 4;
        let line_len = if term_width > title_len {
            (term_width - title_len) / 2
        } else {
            0
        };

        let line = "═".repeat(line_len.min(30));

        println!();
        if self.supports_color() {
            println!("{} {} {}", line.cyan(), title.cyan().bold(), line.cyan());
        } else {
            println!("{} {} {}", line, title, line);
        }
        println!();
    }

    /// Create a card-style display for information
    pub fn card(&self, title: &str, content: Vec<(&str, String)>) {
        let term_width = self.width();
        let card_width = term_width.saturating_sub(4).clamp(50, 80);

        let supports_color = self.supports_color();

        println!("╭{}╮", "─".repeat(card_width - 2));
        let title_spaces = card_width.saturating_sub(title.width() + 4);
        if supports_color {
            println!("│ {} {}│", title.cyan().bold(), " ".repeat(title_spaces));
        } else {
            println!("│ {} {}│", title, " ".repeat(title_spaces));
        }
        println!("├{}┤", "─".repeat(card_width - 2));

        for (label, value) in content {
            // widths are measured without ANSI codes
            let label_width = strip_ansi_codes(label).width();
            let value_width = strip_ansi_codes(&value).width();
            let content_width = label_width + value_width + 4;

            let spaces = if content_width < card_width - 1 {
                card_width - content_width - 1
            } else {
                1
            };

            if supports_color {
                println!("│ {}: {}{}│", label.dimmed(), value, " ".repeat(spaces));
            } else {
                println!("│ {}: {}{}│", label, value, " ".repeat(spaces));
            }
        }

        println!("╰{}╯", "─".repeat(card_width - 2));
        println!();
    }

    /// One line per task: checkbox, id, title, due date, category, label
    pub fn task_table(&self, tasks: &[Task]) {
        if tasks.is_empty() {
            self.info("No tasks");
            return;
        }

        let title_width = tasks
            .iter()
            .map(|t| t.title.width())
            .max()
            .unwrap_or(0)
            .clamp(5, 40);
        let id_width = tasks
            .iter()
            .map(|t| t.id.to_string().len())
            .max()
            .unwrap_or(1);

        for task in tasks {
            let check = if task.completed { "[x]" } else { "[ ]" };
            let title = truncate(&task.title, title_width);
            let padding = title_width.saturating_sub(title.width());
            let title = if task.completed && self.supports_color() {
                title.dimmed().strikethrough().to_string()
            } else {
                title
            };
            println!(
                "{} {:>id_width$}  {}{}  {}  {:<12} {}",
                check,
                task.id,
                title,
                " ".repeat(padding),
                task.due_date.format("%Y-%m-%d"),
                truncate(&self.format_field(Some(task.category.clone())), 12),
                self.format_label(task.label),
                id_width = id_width,
            );
        }
    }

    pub fn template_list(&self, templates: &[TaskTemplate]) {
        if templates.is_empty() {
            self.info("No templates");
            return;
        }
        for template in templates {
            let name = self.colorize(&template.name, |n| n.bold().to_string());
            println!(
                "{:>4}  {}  ({} items, {})",
                template.id,
                name,
                template.items.len(),
                self.format_field(Some(template.category.clone()))
            );
            for item in &template.items {
                println!("        +{}d  {}", item.due_date_offset, item.title);
            }
        }
    }

    /// Spinner shown while a request is in flight
    pub fn spinner(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn input(&self, prompt: &str) -> Result<String> {
        Ok(Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .interact_text()?)
    }

    pub fn password(&self, prompt: &str) -> Result<String> {
        Ok(Password::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .interact()?)
    }

    /// Password prompt that may be left empty
    pub fn password_optional(&self, prompt: &str) -> Result<String> {
        Ok(Password::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()?)
    }

    pub fn new_password(&self) -> Result<String> {
        Ok(Password::with_theme(&ColorfulTheme::default())
            .with_prompt("New password")
            .with_confirmation("Repeat password", "Passwords do not match")
            .interact()?)
    }

    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        Ok(Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }

    /// Get terminal width for responsive layout
    pub fn width(&self) -> usize {
        self.term.size().1 as usize
    }

    /// Check if terminal supports color
    pub fn supports_color(&self) -> bool {
        self.term.features().colors_supported()
    }
}

impl Default for UI {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut `text` to at most `width` columns, marking the cut with `…`
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 8), "a longe…");
        assert_eq!(truncate("日本語のタスク", 7), "日本語…");
    }
}
