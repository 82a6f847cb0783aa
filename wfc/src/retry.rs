use rand::Rng;

use crate::model::Model;
use crate::observe::Outcome;
use crate::run::{collapse, create_wave};
use crate::wave::Wave;

/// Retry policies for contradictory solves. Each attempt runs on a fresh
/// wave; only `Outcome::Fail` triggers another attempt — an unconverged solve
/// is reported, not retried.
pub trait Retry: private::Sealed {
    type Return;
    fn retry<M, R>(&mut self, model: &M, limit: usize, rng: &mut R) -> Self::Return
    where
        M: Model + ?Sized,
        R: Rng;
}

/// Retries contradictions until the solve completes or hits its limit.
#[derive(Debug, Clone, Copy)]
pub struct Forever;

impl Retry for Forever {
    type Return = (Outcome, Wave);
    fn retry<M, R>(&mut self, model: &M, limit: usize, rng: &mut R) -> Self::Return
    where
        M: Model + ?Sized,
        R: Rng,
    {
        loop {
            let mut wave = create_wave(model);
            match collapse(model, &mut wave, limit, rng) {
                Outcome::Fail => continue,
                outcome => return (outcome, wave),
            }
        }
    }
}

/// Retries contradictions a bounded number of times; the last attempt's wave
/// is returned alongside its outcome.
#[derive(Debug, Clone, Copy)]
pub struct NumTimes(pub usize);

impl Retry for NumTimes {
    type Return = (Outcome, Wave);
    fn retry<M, R>(&mut self, model: &M, limit: usize, rng: &mut R) -> Self::Return
    where
        M: Model + ?Sized,
        R: Rng,
    {
        loop {
            let mut wave = create_wave(model);
            match collapse(model, &mut wave, limit, rng) {
                Outcome::Fail => {
                    if self.0 == 0 {
                        return (Outcome::Fail, wave);
                    }
                    self.0 -= 1;
                }
                outcome => return (outcome, wave),
            }
        }
    }
}

mod private {
    use super::*;

    pub trait Sealed {}

    impl Sealed for Forever {}
    impl Sealed for NumTimes {}
}
