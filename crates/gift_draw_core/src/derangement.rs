//! Random giver→receiver assignment with no self-gifts and no within-group gifts.
//!
//! Each attempt grows disjoint cycles one link at a time: a chain starts at a
//! random unplaced participant and is extended with a uniformly random
//! unplaced participant from a different group until it closes back on its
//! start. A dead end abandons the whole attempt and a fresh one begins. The
//! attempt budget is explicit so unsolvable group layouts surface as
//! [`GenerationError::TooManyAttempts`] instead of looping forever.

use rand::Rng;

use crate::contract::Participant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    receivers: Vec<usize>,
}

impl Permutation {
    /// Index of the participant that `giver` gives a gift to.
    pub fn receiver_of(&self, giver: usize) -> usize {
        self.receivers[giver]
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.receivers
    }

    pub fn inverse(&self) -> Permutation {
        let mut givers = vec![0; self.receivers.len()];
        for (giver, receiver) in self.receivers.iter().enumerate() {
            givers[*receiver] = giver;
        }
        Permutation { receivers: givers }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPermutation {
    pub permutation: Permutation,
    /// Attempts consumed, including the successful one.
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("no valid assignment found within {attempts} attempts")]
    TooManyAttempts { attempts: usize },
    /// The generator produced an assignment that breaks its own post-conditions.
    /// This is a defect, never a retryable condition.
    #[error("generated assignment violates its invariants: {0}")]
    InvariantViolation(String),
}

pub fn generate(
    roster: &[Participant],
    max_attempts: usize,
    rng: &mut impl Rng,
) -> Result<GeneratedPermutation, GenerationError> {
    for attempt in 1..=max_attempts {
        let Some(receivers) = build_chains(roster, rng) else {
            continue;
        };

        let permutation = verify_assignment(roster, receivers)?;
        return Ok(GeneratedPermutation {
            permutation,
            attempts: attempt,
        });
    }

    Err(GenerationError::TooManyAttempts {
        attempts: max_attempts,
    })
}

/// One attempt. Returns `None` when a chain cannot be extended.
fn build_chains(roster: &[Participant], rng: &mut impl Rng) -> Option<Vec<Option<usize>>> {
    let mut receivers = vec![None; roster.len()];
    let mut remaining: Vec<usize> = (0..roster.len()).collect();
    // (chain start, chain tail); the start stays in `remaining` until the chain closes.
    let mut open_chain: Option<(usize, usize)> = None;

    while !remaining.is_empty() {
        let (start, tail) = open_chain.unwrap_or_else(|| {
            let start = remaining[rng.gen_range(0..remaining.len())];
            (start, start)
        });

        let tail_group = &roster[tail].group;
        let candidate_slots: Vec<usize> = (0..remaining.len())
            .filter(|slot| roster[remaining[*slot]].group != *tail_group)
            .collect();
        if candidate_slots.is_empty() {
            return None;
        }

        let slot = candidate_slots[rng.gen_range(0..candidate_slots.len())];
        let candidate = remaining.swap_remove(slot);
        receivers[tail] = Some(candidate);

        open_chain = if candidate == start {
            None
        } else {
            Some((start, candidate))
        };
    }

    Some(receivers)
}

fn verify_assignment(
    roster: &[Participant],
    receivers: Vec<Option<usize>>,
) -> Result<Permutation, GenerationError> {
    let n = roster.len();
    if receivers.len() != n {
        return Err(GenerationError::InvariantViolation(format!(
            "assignment covers {} givers for a roster of {n}",
            receivers.len()
        )));
    }

    let mut taken = vec![false; n];
    let mut assigned = Vec::with_capacity(n);
    for (giver, receiver) in receivers.into_iter().enumerate() {
        let Some(receiver) = receiver else {
            return Err(GenerationError::InvariantViolation(format!(
                "giver {giver} has no receiver"
            )));
        };
        if receiver >= n {
            return Err(GenerationError::InvariantViolation(format!(
                "giver {giver} maps outside the roster"
            )));
        }
        if taken[receiver] {
            return Err(GenerationError::InvariantViolation(format!(
                "receiver {receiver} is assigned more than once"
            )));
        }
        if receiver == giver {
            return Err(GenerationError::InvariantViolation(format!(
                "giver {giver} is assigned to themselves"
            )));
        }
        if roster[receiver].group == roster[giver].group {
            return Err(GenerationError::InvariantViolation(format!(
                "giver {giver} is assigned within their own group"
            )));
        }
        taken[receiver] = true;
        assigned.push(receiver);
    }

    Ok(Permutation {
        receivers: assigned,
    })
}
