//! Workflow modules composing the outreach domain.

pub mod outreach;
