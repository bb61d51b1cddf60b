use std::sync::Arc;

use agent_core::mail::{Delivery, Mailer, is_plausible_email};
use agent_core::{GenerationOptions, LlmProvider, ToolRegistry};

use super::ResearchReport;
use crate::error::{ResearchError, Result};

/// Mails finished research reports
pub struct ReportMailer {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    generation: GenerationOptions,
}

impl ReportMailer {
    pub fn new(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>, mut generation: GenerationOptions) -> Self {
        generation.max_tokens = generation.max_tokens.max(super::REPORT_MAX_TOKENS);
        Self {
            provider,
            tools,
            generation,
        }
    }

    pub async fn send(&self, to: &str, report: &ResearchReport) -> Result<Delivery> {
        let to = to.trim();
        if !is_plausible_email(to) {
            return Err(ResearchError::InvalidRecipient(to.to_string()));
        }

        // The system prompt names the company, so each report gets its own mailer
        let mailer = Mailer::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.tools),
            self.generation.clone(),
            email_prompt(&report.company),
        );

        Ok(mailer.deliver(to, email_request(to, report)).await?)
    }
}

fn subject(company: &str) -> String {
    format!("{company} Investment Research")
}

fn email_prompt(company: &str) -> String {
    format!(
        "You are an email assistant. Your only job is to format and send the research report about {company}.

IMPORTANT REQUIREMENTS:
1. Format the email with proper HTML tables and styling
2. Present the information clearly and professionally
3. Use the exact content provided; do not summarize or reduce it
4. Keep every detail, link and section of the original report
5. Do not add any introduction or conclusion beyond what's in the report
6. Use the subject line \"{}\"

Send only the actual complete findings, never placeholder text.",
        subject(company)
    )
}

fn email_request(to: &str, report: &ResearchReport) -> String {
    format!(
        "Send an email with the following details:\n\nTO: {to}\nSUBJECT: {}\n\nCONTENT:\n{}\n\n\
         IMPORTANT:\n\
         1. Include ALL the information above in the email\n\
         2. Format it with proper HTML tables and styling\n\
         3. Preserve every detail exactly as provided\n\
         4. Do NOT summarize or reduce the information",
        subject(&report.company),
        report.html
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::testing::{EmailTool, ScriptedProvider};

    fn report() -> ResearchReport {
        ResearchReport {
            company: "Acme".into(),
            website: "https://acme.test".into(),
            html: "<div class='report-container'><h1>Acme</h1></div>".into(),
            complete: true,
            finalized: false,
            tool_calls: 3,
        }
    }

    fn mailer(provider: Arc<ScriptedProvider>) -> ReportMailer {
        let mut tools = ToolRegistry::new();
        tools.register(EmailTool);
        ReportMailer::new(provider, Arc::new(tools), GenerationOptions::for_model("scripted"))
    }

    #[tokio::test]
    async fn test_send_report() {
        let provider = Arc::new(ScriptedProvider::new([
            "```tool\n{\"tool\": \"send_email\", \"arguments\": {\"to\": \"vc@fund.test\"}}\n```",
            "Report sent.",
        ]));

        let delivery = mailer(provider.clone()).send(" vc@fund.test ", &report()).await.unwrap();
        assert!(delivery.sent);

        let prompt = &provider.prompts()[0];
        assert!(prompt[0].content.contains("research report about Acme"));
        assert!(prompt[0].content.contains("\"Acme Investment Research\""));
        assert!(prompt[1].content.contains("TO: vc@fund.test\nSUBJECT: Acme Investment Research"));
        assert!(prompt[1].content.contains("<h1>Acme</h1>"));
    }

    #[tokio::test]
    async fn test_send_rejects_bad_recipient() {
        let provider = Arc::new(ScriptedProvider::new(Vec::<String>::new()));
        let result = mailer(provider.clone()).send("not-an-address", &report()).await;
        assert!(matches!(result, Err(ResearchError::InvalidRecipient(_))));
        assert_eq!(provider.calls(), 0);
    }
}
