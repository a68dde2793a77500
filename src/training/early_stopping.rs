// ============================================================
// Early Stopping State
// ============================================================
// Tracks the best validation loss and how many validation
// rounds in a row failed to beat it.
//
//   loss <  best  → Improved   (best = loss, counter = 0)
//   loss >= best  → NotImproved, counter += 1
//                   counter == patience → Exhausted
//
// A NaN loss never compares lower, so it counts as a
// non-improving round.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Strictly lower than every previous loss: promote this epoch
    Improved,
    /// Not better, patience not yet used up
    NotImproved,
    /// Not better, and this was the `patience`-th such round in a row
    Exhausted,
}

impl Verdict {
    pub fn improved(self) -> bool {
        self == Verdict::Improved
    }
}

#[derive(Debug, Clone)]
pub struct EarlyStopping {
    best_loss:           f64,
    without_improvement: usize,
    patience:            usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self {
            best_loss:           f64::INFINITY,
            without_improvement: 0,
            patience,
        }
    }

    pub fn observe(&mut self, loss: f64) -> Verdict {
        if loss < self.best_loss {
            self.best_loss           = loss;
            self.without_improvement = 0;
            return Verdict::Improved;
        }

        self.without_improvement += 1;
        if self.without_improvement >= self.patience {
            Verdict::Exhausted
        } else {
            Verdict::NotImproved
        }
    }

    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }

    pub fn rounds_without_improvement(&self) -> usize {
        self.without_improvement
    }
}
