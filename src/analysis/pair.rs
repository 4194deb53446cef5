use std::fmt;
use crate::flow::{FlowId, FlowRecord};

/// Two flow records suspected of being the inbound and outbound legs of a
/// relay. Borrows from the window snapshot it was generated from.
#[derive(Debug, Clone, Copy)]
pub struct FlowPair<'a> {
    pub first: &'a FlowRecord,
    pub second: &'a FlowRecord,
}

impl<'a> FlowPair<'a> {
    pub fn new(first: &'a FlowRecord, second: &'a FlowRecord) -> Self {
        Self { first, second }
    }

    pub fn ids(&self) -> (FlowId, FlowId) {
        (self.first.id, self.second.id)
    }
}

impl fmt::Display for FlowPair<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.first.flow, self.second.flow)
    }
}
