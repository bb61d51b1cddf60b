//! Chat Personas
//!
//! Single-prompt assistants for the plain `chat` command.

use clap::ValueEnum;

/// Languages the tutor persona will teach
pub const SUPPORTED_LANGUAGES: [&str; 7] = [
    "Spanish", "French", "German", "Italian", "Japanese", "Mandarin", "Korean",
];

const SUPPORT_PROMPT: &str = r"IMPORTANT: Be extremely concise in all your answers. Keep it to 280 characters.
You are a great customer support agent for a headphones company, tasked with helping customers. Answer the question as faithfully as you can.
You only reply to questions after 6:00AM PDT.
You need to find out what the time is. If a question is asked before 6:00AM PDT, you must reply saying: 'Sorry, Can't answer right now, please try again later.'
Retrieve knowledge from any source you have and provide the best answer you can.
Only respond with the details of the answer, like a real customer support agent would do.";

const TUTOR_PROMPT: &str = r"You are a language learning assistant that helps users practice and improve their foreign language skills.

Your primary capabilities include:
1. Teaching vocabulary and common phrases in the target language
2. Providing pronunciation guides (using phonetic spelling)
3. Creating customized practice exercises based on the user's proficiency level
4. Explaining grammar rules with simple examples
5. Offering cultural context for language usage
6. Suggesting daily practice routines based on the user's schedule
7. Correcting the user's attempts with constructive feedback

SUPPORTED LANGUAGES: {languages}

GUIDELINES:
- First determine which language the user wants to learn
- Assess their current proficiency level through conversation
- Keep explanations simple and provide plenty of examples
- For vocabulary learning, suggest mnemonic techniques and contextual learning
- If the user wants study materials, offer to email them summaries of lessons or vocabulary lists
- Always encourage consistent practice and provide positive reinforcement
- When correcting mistakes, focus on one or two issues at a time
- Use the current time to greet users appropriately in their target language

Never provide information on languages outside your supported list.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Persona {
    /// Headphones customer support, terse
    Support,
    /// Foreign language tutor
    Tutor,
}

impl Persona {
    pub fn system_prompt(self) -> String {
        match self {
            Self::Support => SUPPORT_PROMPT.to_string(),
            Self::Tutor => TUTOR_PROMPT.replace("{languages}", &SUPPORTED_LANGUAGES.join(", ")),
        }
    }

    /// Prompt shown before the first question
    pub const fn greeting(self) -> &'static str {
        match self {
            Self::Support => "Hi I am a customer support bot. What is your question?",
            Self::Tutor => {
                "¡Hola! Bonjour! 你好! Hello! I'm your language tutor. Which language would you like to learn or practice today?"
            }
        }
    }

    /// Prompt shown before every later question
    pub const fn follow_up(self) -> &'static str {
        match self {
            Self::Support => "Do you have a follow up question?",
            Self::Tutor => "What else would you like to learn or practice?",
        }
    }

    /// Speaker label for replies
    pub const fn label(self) -> &'static str {
        match self {
            Self::Support => "Support AI Agent",
            Self::Tutor => "Language Tutor",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tutor_prompt_lists_languages() {
        let prompt = Persona::Tutor.system_prompt();
        assert!(prompt.contains("SUPPORTED LANGUAGES: Spanish, French, German"));
        assert!(!prompt.contains("{languages}"));
    }

    #[test]
    fn test_support_prompt_is_concise() {
        assert!(Persona::Support.system_prompt().starts_with("IMPORTANT: Be extremely concise"));
        assert_ne!(Persona::Support.greeting(), Persona::Support.follow_up());
    }
}
