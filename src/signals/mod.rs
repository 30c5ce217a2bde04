//! Rule evaluation and signal classification.

pub mod classifier;
pub mod rules;

pub use classifier::{Candidate, Classification, SignalClassifier};
pub use rules::{ConditionSet, PrimaryRule, SecondaryRule};
