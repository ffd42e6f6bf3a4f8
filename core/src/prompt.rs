/// Persona and answer convention placed between the retrieved context and the
/// user's question. Ends with an open `Q:` turn the query is appended to.
pub const SYSTEM_PROMPT: &str = concat!(
    "The following is a conversation with an AI assistant. ",
    "The assistant is helpful, creative, clever, and very friendly. \n",
    "You should end your answer with +++.\n",
    "Q:What is your name?+++\n",
    "A:My name is LLM_TA+++\n",
    "Q:",
);

/// Closes the question turn and opens the answer turn.
pub const ANSWER_SUFFIX: &str = "+++\nA:";

/// Marks the end of an answer in [`SYSTEM_PROMPT`] and [`ANSWER_SUFFIX`].
pub const ANSWER_TERMINATOR: &str = "+++";

/// Where generation has to stop: the answer terminator or the start of a new
/// question turn.
pub const STOP_SEQUENCES: [&str; 2] = [ANSWER_TERMINATOR, "Q:"];

/// Builds the prompt sent to the completion engine.
///
/// The output is `context + SYSTEM_PROMPT + query + ANSWER_SUFFIX` where the
/// context is the retrieved documents joined with newlines. The query is used
/// as-is, a query containing a stop sequence ends the answer early.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler;

impl PromptAssembler {
    #[must_use]
    pub fn build<S: AsRef<str>>(&self, retrieved: &[S], query: &str) -> String {
        let context = retrieved
            .iter()
            .map(|doc| doc.as_ref())
            .collect::<Vec<&str>>()
            .join("\n");
        let mut prompt = String::with_capacity(
            context.len() + SYSTEM_PROMPT.len() + query.len() + ANSWER_SUFFIX.len(),
        );
        prompt.push_str(&context);
        prompt.push_str(SYSTEM_PROMPT);
        prompt.push_str(query);
        prompt.push_str(ANSWER_SUFFIX);
        prompt
    }
}

#[must_use]
pub fn default_stop_sequences() -> Vec<String> {
    STOP_SEQUENCES.iter().map(ToString::to_string).collect()
}
