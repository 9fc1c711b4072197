//! Integration scenarios.

#[cfg(test)]
mod harness;

#[cfg(test)]
mod admission;
#[cfg(test)]
mod scenarios;
#[cfg(test)]
mod sync;
