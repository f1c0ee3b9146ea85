use std::collections::HashMap;

/// Running caption numbers, one sequence per identifier.
#[derive(Debug, Clone)]
pub struct IndexCounter {
    start: i64,
    increment: i64,
    current: HashMap<String, i64>,
}

impl IndexCounter {
    pub fn new(start: i64, increment: i64) -> Self {
        Self {
            start,
            increment,
            current: HashMap::new(),
        }
    }

    /// The number the next caption of `identifier` gets.
    pub fn current(&self, identifier: &str) -> i64 {
        self.current.get(identifier).copied().unwrap_or(self.start)
    }

    pub fn advance(&mut self, identifier: &str) {
        let next = self.current(identifier) + self.increment;
        self.current.insert(identifier.to_string(), next);
    }
}
