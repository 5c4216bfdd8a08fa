//! Prompt rendering

use crate::models::{CompanyProfile, ConversationTurn, TourStep};
use crate::retrieval::ScoredDocument;
use std::fmt::Write;

/// Question that separates the short answer from the detailed one
pub const MORE_INFO_QUESTION: &str = "Would you like to know more about this?";

/// Line used when retrieval found nothing
pub const NO_CONTEXT_LINE: &str =
    "No specific context is available for this question. Answer from general company knowledge.";

/// Everything about the current turn that goes into the prompt
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub current_page: &'a str,
    pub tour_started: bool,
    pub current_step: Option<&'a TourStep>,
    pub history: &'a [ConversationTurn],
    pub user_input: &'a str,
    pub documents: &'a [ScoredDocument],
}

/// Renders concierge prompts for one company
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    company: CompanyProfile,
}

impl PromptBuilder {
    pub fn new(company: CompanyProfile) -> Self {
        Self { company }
    }

    pub fn company(&self) -> &CompanyProfile {
        &self.company
    }

    pub fn build(&self, ctx: &PromptContext<'_>) -> String {
        let name = &self.company.name;
        let mut prompt = String::with_capacity(2048);

        // writeln! into a String cannot fail
        let _ = writeln!(
            prompt,
            "You are an AI assistant for {name}. Your role is to act as a knowledgeable and \
             helpful concierge for the {name} website, providing a tour and relevant information \
             about the company. Always maintain a professional, friendly, and helpful tone."
        );
        prompt.push('\n');

        self.write_company(&mut prompt);

        let _ = writeln!(prompt, "Current page: {}", ctx.current_page);
        let _ = writeln!(
            prompt,
            "Tour started: {}",
            if ctx.tour_started { "Yes" } else { "No" }
        );
        match ctx.current_step {
            Some(step) => {
                let _ = writeln!(
                    prompt,
                    "Current tour step: {} (page: {}) - {}",
                    step.title, step.page_name, step.description
                );
            }
            None => prompt.push_str("Current tour step: None\n"),
        }
        prompt.push('\n');

        if !ctx.history.is_empty() {
            prompt.push_str("Recent conversation:\n");
            for turn in ctx.history {
                let _ = writeln!(prompt, "{}: {}", turn.speaker, turn.text);
            }
            prompt.push('\n');
        }

        let _ = writeln!(
            prompt,
            "Based on the following information about {name}, please respond to the user's input: '{}'",
            ctx.user_input
        );
        prompt.push('\n');

        prompt.push_str("Context:\n");
        if ctx.documents.is_empty() {
            let _ = writeln!(prompt, "{}", NO_CONTEXT_LINE);
        } else {
            for scored in ctx.documents {
                let _ = write!(
                    prompt,
                    "{}:\n{}\n\n",
                    scored.document.title, scored.document.content
                );
            }
        }
        prompt.push('\n');

        self.write_guidelines(&mut prompt);
        prompt.push_str("\nInitial Response:");
        prompt
    }

    fn write_company(&self, prompt: &mut String) {
        let company = &self.company;
        let has_facts = !company.description.is_empty()
            || company.industry.is_some()
            || company.website.is_some()
            || !company.facts.is_empty();
        if !has_facts {
            return;
        }

        let _ = writeln!(prompt, "About {}:", company.name);
        if !company.description.is_empty() {
            let _ = writeln!(prompt, "{}", company.description);
        }
        if let Some(industry) = &company.industry {
            let _ = writeln!(prompt, "- Industry: {}", industry);
        }
        if let Some(website) = &company.website {
            let _ = writeln!(prompt, "- Website: {}", website);
        }
        for (key, value) in &company.facts {
            let _ = writeln!(prompt, "- {}: {}", key, value);
        }
        prompt.push('\n');
    }

    fn write_guidelines(&self, prompt: &mut String) {
        let name = &self.company.name;
        let guidelines = [
            "Provide a concise initial response (50-75 words) that addresses the main point of the user's query.".to_string(),
            format!("Follow the initial response with \"{}\" to offer additional information.", MORE_INFO_QUESTION),
            format!("If the user asks about {name}'s services, founders, background, or any related information, focus on the most relevant details in the initial response."),
            "For website tours, briefly mention the main sections of the site in the initial response.".to_string(),
            "If asked about navigating to a specific page, provide brief instructions in the initial response.".to_string(),
            format!("For unrelated questions, politely redirect to {name} topics in the initial response."),
            "Address inappropriate language with a brief, polite message about professional communication.".to_string(),
            format!("If unsure, offer to help find information on the {name} website or suggest contacting {name} directly."),
            "Always maintain a professional, friendly, and helpful tone.".to_string(),
        ];

        prompt.push_str("Guidelines:\n");
        for (idx, line) in guidelines.iter().enumerate() {
            let _ = writeln!(prompt, "{}. {}", idx + 1, line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentType, Document};
    use crate::retrieval::RelevanceScores;

    fn builder() -> PromptBuilder {
        PromptBuilder::new(CompanyProfile {
            name: "Acme".to_string(),
            description: "We make anvils.".to_string(),
            ..Default::default()
        })
    }

    fn ctx<'a>(docs: &'a [ScoredDocument], history: &'a [ConversationTurn]) -> PromptContext<'a> {
        PromptContext {
            current_page: "pricing",
            tour_started: true,
            current_step: None,
            history,
            user_input: "how much?",
            documents: docs,
        }
    }

    #[test]
    fn test_sections_in_order() {
        let docs = vec![ScoredDocument {
            document: Document::new(1, "Anvil Pricing", "Anvils cost 10 coins", ContentType::Text),
            scores: RelevanceScores::default(),
        }];
        let history = vec![
            ConversationTurn::user("hello"),
            ConversationTurn::assistant("hi there"),
        ];
        let prompt = builder().build(&ctx(&docs, &history));

        let positions: Vec<usize> = [
            "You are an AI assistant for Acme",
            "We make anvils.",
            "Current page: pricing",
            "Tour started: Yes",
            "Current tour step: None",
            "User: hello",
            "Assistant: hi there",
            "respond to the user's input: 'how much?'",
            "Anvil Pricing:\nAnvils cost 10 coins",
            "Guidelines:\n1. ",
            "9. Always maintain",
        ]
        .iter()
        .map(|needle| prompt.find(needle).unwrap_or_else(|| panic!("missing {:?}", needle)))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(prompt.ends_with("Initial Response:"));
    }

    #[test]
    fn test_empty_context_line() {
        let prompt = builder().build(&ctx(&[], &[]));
        assert!(prompt.contains(NO_CONTEXT_LINE));
        assert!(!prompt.contains("Recent conversation"));
    }
}
