/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    /// Distinct words in the working set.
    pub total: usize,
    /// Words drawn so far, including the current one.
    pub drawn: usize,
    pub remaining: usize,
    pub attempts: u32,
    pub score: u32,
    pub is_complete: bool,
}
