//! Company Due Diligence
//!
//! ```text
//! request ─► agent (web/LinkedIn/X tools) ─► compile prompt ─► agent
//!                                                     │ more tool calls
//!                                                     ▼
//!                                              finalize prompt ─► agent
//! ```
//!
//! The reply is wrapped with the report stylesheet and checked for the
//! sections a usable report has. An incomplete report is still returned.

mod mailer;
pub mod report;

use std::sync::Arc;

use agent_core::{
    Agent, AgentConfig, Conversation, GenerationOptions, LlmProvider, Message, ToolRegistry,
};
use serde::Serialize;

use crate::error::{Result, required};

pub use mailer::ReportMailer;

/// Reports are long; the default budget truncates them
const REPORT_MAX_TOKENS: u32 = 4096;

/// Tool calls a single research pass may make
const RESEARCH_MAX_ITERATIONS: usize = 12;

pub const COMPILE_PROMPT: &str = "Based on all the information you've gathered, compile a comprehensive \
due diligence report.

Requirements:
1. Organize all findings in proper HTML tables with clear styling
2. Include ALL information you've discovered, not just highlights
3. Use section headings for different aspects (Company Overview, Team, Funding, etc.)
4. Include links to sources wherever available
5. Present facts rather than opinions
6. Format the report for maximum readability and professional appearance
7. Do not include any placeholders or mentions of \"gathering information\"; only present actual findings

Create a complete, thorough report with all available information. It will be used for investment decisions.";

pub const FINALIZE_PROMPT: &str = "Now that you have all the information, create the final complete due \
diligence report with proper HTML formatting and tables. Include everything you've found about the company.";

/// System prompt for one company
pub fn research_prompt(company: &str, website: &str) -> String {
    format!(
        "Perform initial due diligence on {company} for my investment research. The company website is {website}.

1. Gather key company information with web search:
   - company website, founding date and location
   - what the startup does and which problem it solves
   - business model and revenue streams
   - current stage (seed, Series A, B, etc.)
2. Research the team with LinkedIn search:
   - founders and key executives with relevant background
   - notable advisors or board members
3. Gather funding and financials with web search:
   - funding history and investors
   - publicly available growth or revenue metrics (Crunchbase, PitchBook or other public sources)
   - recent funding rounds or financial news
4. Examine market position:
   - main competitors and market size
   - customer reviews or testimonials
   - major partnerships or client relationships
5. Track recent activity on X (Twitter): list the company's latest 3 posts
6. Format and deliver:
   - compile findings into a concise report using HTML tables with CSS
   - include all relevant links for further research
   - focus on facts and clearly state when information is unavailable
   - DO NOT send any emails during this research phase

Do not include placeholder text or say that you are \"currently gathering information\". If something \
is unavailable, say so and still deliver a complete report with whatever you found."
    )
}

fn research_request(company: &str, website: &str) -> String {
    format!(
        "Perform detailed due diligence on {company}. Their website is {website}. I need comprehensive \
         information on the company, founding team, funding history, market position, and recent \
         activities. Format the results in clear HTML tables."
    )
}

/// A finished research run
#[derive(Clone, Debug, Serialize)]
pub struct ResearchReport {
    pub company: String,
    pub website: String,
    /// Styled HTML, ready to display or mail
    pub html: String,
    /// Whether the reply passed the completeness check
    pub complete: bool,
    /// Whether the compile step called tools and a finalize pass was needed
    pub finalized: bool,
    pub tool_calls: usize,
}

/// Researches a company with the tools in the registry
pub struct DueDiligence {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    generation: GenerationOptions,
}

impl DueDiligence {
    pub fn new(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>, mut generation: GenerationOptions) -> Self {
        generation.max_tokens = generation.max_tokens.max(REPORT_MAX_TOKENS);
        Self {
            provider,
            tools,
            generation,
        }
    }

    pub async fn run(&self, company: &str, website: &str) -> Result<ResearchReport> {
        let company = required("company", company)?;
        let website = required("website", website)?;

        let agent = Agent::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.tools),
            AgentConfig {
                system_prompt: research_prompt(&company, &website),
                max_iterations: RESEARCH_MAX_ITERATIONS,
                generation: self.generation.clone(),
                ..AgentConfig::default()
            },
        );

        let mut conversation = Conversation::with_system_prompt(agent.build_system_prompt());
        conversation.push(Message::user(research_request(&company, &website)));

        tracing::info!(%company, "Gathering research");
        let gathered = agent.run_traced(&mut conversation).await?;
        let mut tool_calls = gathered.tool_results.len();

        tracing::info!(%company, tools = tool_calls, "Compiling report");
        conversation.push(Message::user(COMPILE_PROMPT));
        let compiled = agent.run_traced(&mut conversation).await?;
        tool_calls += compiled.tool_results.len();

        let finalized = !compiled.tool_results.is_empty();
        let content = if finalized {
            tracing::info!(%company, "Compile step used tools, finalizing");
            conversation.push(Message::user(FINALIZE_PROMPT));
            let last = agent.run_traced(&mut conversation).await?;
            tool_calls += last.tool_results.len();
            last.reply
        } else {
            compiled.reply
        };

        let complete = report::looks_complete(&content);
        if !complete {
            tracing::warn!(%company, chars = content.chars().count(), "Report may be incomplete");
        }

        Ok(ResearchReport {
            html: report::wrap_report(&content),
            company,
            website,
            complete,
            finalized,
            tool_calls,
        })
    }
}
