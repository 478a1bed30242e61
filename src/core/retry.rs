/// Mutable state of one invocation's retry loop.
///
/// `system` only ever grows: each failed attempt appends a corrective
/// directive that is carried into every later attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    attempt: u32,
    max_attempts: u32,
    system: String,
}

impl RetryState {
    pub fn new(max_attempts: u32, system: impl Into<String>) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            system: system.into(),
        }
    }

    /// Advance to the next attempt and return its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn has_remaining(&self) -> bool {
        self.attempt < self.max_attempts
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn amend(&mut self, directive: &str) {
        self.system.push_str("\n\n");
        self.system.push_str(directive);
    }
}
