//! Cross-crate consensus scenarios

pub mod support;

#[cfg(test)]
mod round_lifecycle;
#[cfg(test)]
mod secret_sharing_flow;
#[cfg(test)]
mod validation_attacks;
