//! Chronological train/test split of a user's sessions.
//!
//! No shuffling: sessions are already in discovery (time) order, so the
//! first `floor(train_split * n)` ids train and the rest test.

use log::debug;

/// Session ids of one user partitioned into train and test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Number of training sessions out of `total`.
pub fn split_point(total: usize, train_split: f64) -> usize {
    let split_at = (train_split * total as f64).floor() as usize;
    split_at.min(total)
}

/// Split `session_ids` (in discovery order) into a train prefix and test suffix.
pub fn split_sessions(mut session_ids: Vec<usize>, train_split: f64) -> TrainTestSplit {
    let split_at = split_point(session_ids.len(), train_split);

    // split_off leaves [0..split_at] in place and returns the tail
    let test = session_ids.split_off(split_at);

    debug!(
        "[Split] {} train, {} test sessions",
        session_ids.len(),
        test.len()
    );

    TrainTestSplit {
        train: session_ids,
        test,
    }
}
