use std::cell::RefCell;
use std::collections::BTreeMap;

use provup_types::ProviderAddr;
use provup_types::registry::DEFAULT_HOST;

use crate::{LookupError, ProviderSource};

#[derive(Debug, Clone)]
enum Answer {
    Namespace(String),
    Fail(String),
}

/// Answers lookups from a fixed table of type name to namespace.
///
/// Types missing from the table are reported as not known. Every lookup is recorded so callers
/// can assert which names were queried.
#[derive(Debug, Default)]
pub struct InMemorySource {
    answers: BTreeMap<String, Answer>,
    lookups: RefCell<Vec<String>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, type_name: &str, namespace: &str) -> Self {
        self.answers
            .insert(type_name.to_string(), Answer::Namespace(namespace.to_string()));
        self
    }

    /// Makes lookups of `type_name` fail with a non-definitive error.
    pub fn with_failure(mut self, type_name: &str, message: &str) -> Self {
        self.answers
            .insert(type_name.to_string(), Answer::Fail(message.to_string()));
        self
    }

    /// Type names looked up so far, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.borrow().clone()
    }
}

impl ProviderSource for InMemorySource {
    fn lookup_legacy(&self, legacy: &ProviderAddr) -> Result<ProviderAddr, LookupError> {
        self.lookups.borrow_mut().push(legacy.type_name.clone());
        match self.answers.get(&legacy.type_name) {
            Some(Answer::Namespace(ns)) => Ok(ProviderAddr::new(
                DEFAULT_HOST,
                ns.clone(),
                legacy.type_name.clone(),
            )),
            Some(Answer::Fail(message)) => Err(LookupError::Unavailable(message.clone())),
            None => Err(LookupError::NotKnown {
                addr: legacy.clone(),
            }),
        }
    }
}
