//! Distribution engine: picks which interval supplies the next value, or
//! reshapes the draw within a single interval.
//!
//! | kind       | intervals | domain            |
//! |------------|-----------|-------------------|
//! | weighted   | many      | any               |
//! | percentage | many      | any               |
//! | normal     | one       | decimal           |
//! | uniform    | one       | integer, decimal  |

use crate::context::GenContext;
use crate::field::FieldType;
use crate::generators::Builtin;
use crate::scope::Scope;
use datagen_core::{Emitter, GenError, Value};
use rand::Rng;
use rand_distr::{Distribution as _, Normal};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Draws a normal distribution may reject before clamping.
pub const MAX_NORMAL_ATTEMPTS: usize = 1000;

const PERCENT_TOTAL: f64 = 100.0;
const PERCENT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionKind {
    Weighted,
    Percentage,
    Normal,
    Uniform,
}

impl DistributionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionKind::Weighted => "weighted",
            DistributionKind::Percentage => "percentage",
            DistributionKind::Normal => "normal",
            DistributionKind::Uniform => "uniform",
        }
    }

    pub fn is_compatible_domain(&self, type_name: &str) -> bool {
        match self {
            DistributionKind::Normal => type_name == "decimal",
            DistributionKind::Uniform => matches!(type_name, "integer" | "decimal"),
            DistributionKind::Weighted | DistributionKind::Percentage => true,
        }
    }

    pub fn supports_multiple_intervals(&self) -> bool {
        matches!(self, DistributionKind::Weighted | DistributionKind::Percentage)
    }
}

impl FromStr for DistributionKind {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weight" | "weighted" => Ok(DistributionKind::Weighted),
            "percent" | "percentage" => Ok(DistributionKind::Percentage),
            "normal" => Ok(DistributionKind::Normal),
            "uniform" => Ok(DistributionKind::Uniform),
            other => Err(GenError::arity(format!("Unsupported distribution {other:?}"))),
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stateful selector over one or more intervals.
pub struct Distribution {
    kind: DistributionKind,
    intervals: Vec<FieldType>,
    weights: Vec<f64>,
    /// Draws per interval, percentage only
    bins: RefCell<Vec<u64>>,
    total: Cell<u64>,
    /// Bounds of the single decimal interval, normal only
    bounds: Option<(f64, f64)>,
}

impl Distribution {
    /// Validate and build a distribution.
    ///
    /// Weighted distributions without weights weigh every interval equally.
    pub fn new(
        kind: DistributionKind,
        intervals: Vec<FieldType>,
        weights: Vec<f64>,
    ) -> Result<Self, GenError> {
        if intervals.is_empty() {
            return Err(GenError::arity(format!(
                "Distribution {kind} requires at least one interval"
            )));
        }

        if intervals.len() > 1 && !kind.supports_multiple_intervals() {
            return Err(GenError::arity(format!(
                "Distribution {kind} does not support multiple intervals, got {}",
                intervals.len()
            )));
        }

        for interval in &intervals {
            let domain = interval.underlying_type();
            if !kind.is_compatible_domain(domain) {
                return Err(GenError::arity(format!(
                    "Distribution {kind} is not compatible with field type `{domain}`"
                )));
            }
        }

        let nesting = intervals.iter().filter(|i| i.yields_entities()).count();
        if nesting != 0 && nesting != intervals.len() {
            return Err(GenError::arity(format!(
                "Distribution {kind} cannot mix entity and non-entity intervals"
            )));
        }

        let weights = match kind {
            DistributionKind::Weighted | DistributionKind::Percentage => {
                let weights = if weights.is_empty() && kind == DistributionKind::Weighted {
                    vec![1.0; intervals.len()]
                } else {
                    weights
                };
                Self::validate_weights(kind, &weights, intervals.len())?;
                weights
            }
            DistributionKind::Normal | DistributionKind::Uniform => Vec::new(),
        };

        let bounds = match (kind, &intervals[0]) {
            (DistributionKind::Normal, FieldType::Builtin(Builtin::Decimal { min, max })) => {
                Some((*min, *max))
            }
            (DistributionKind::Normal, other) => {
                return Err(GenError::arity(format!(
                    "Distribution normal requires a bounded decimal interval, got `{}`",
                    other.type_name()
                )));
            }
            _ => None,
        };

        let bins = vec![0; intervals.len()];

        Ok(Self {
            kind,
            intervals,
            weights,
            bins: RefCell::new(bins),
            total: Cell::new(0),
            bounds,
        })
    }

    fn validate_weights(kind: DistributionKind, weights: &[f64], intervals: usize) -> Result<(), GenError> {
        if weights.len() != intervals {
            return Err(GenError::arity(format!(
                "Distribution {kind} expects one weight per interval, got {} weights for {intervals} intervals",
                weights.len()
            )));
        }

        let mut total = 0.0;
        for &w in weights {
            if w < 0.0 {
                return Err(GenError::arity(format!("weights cannot be negative: {w}")));
            }
            if !w.is_finite() {
                return Err(GenError::arity(format!("weights must be finite: {w}")));
            }
            total += w;
        }
        if !total.is_finite() {
            return Err(GenError::arity(format!("sum of weights is not finite: {total}")));
        }

        match kind {
            DistributionKind::Percentage if (total - PERCENT_TOTAL).abs() > PERCENT_TOLERANCE => {
                Err(GenError::arity(format!(
                    "percentage weights do not add to 100%. total = {total}"
                )))
            }
            DistributionKind::Weighted if total <= 0.0 => {
                Err(GenError::arity("weights must not all be zero"))
            }
            _ => Ok(()),
        }
    }

    pub fn kind(&self) -> DistributionKind {
        self.kind
    }

    pub fn intervals(&self) -> &[FieldType] {
        &self.intervals
    }

    /// Draw counts per interval so far (percentage only; zero otherwise).
    pub fn bins(&self) -> Vec<u64> {
        self.bins.borrow().clone()
    }

    pub fn generate(
        &self,
        parent_id: Option<&Value>,
        emitter: &mut dyn Emitter,
        scope: &Scope,
        ctx: &mut GenContext,
    ) -> Result<Value, GenError> {
        match self.kind {
            DistributionKind::Weighted => {
                let idx = self.pick_weighted(ctx);
                self.intervals[idx].generate_single(parent_id, emitter, scope, ctx)
            }
            DistributionKind::Percentage => {
                let idx = self.pick_percentage();
                self.intervals[idx].generate_single(parent_id, emitter, scope, ctx)
            }
            DistributionKind::Normal => Ok(self.sample_normal(ctx)),
            DistributionKind::Uniform => {
                self.intervals[0].generate_single(parent_id, emitter, scope, ctx)
            }
        }
    }

    fn pick_weighted(&self, ctx: &mut GenContext) -> usize {
        if self.intervals.len() == 1 {
            return 0;
        }

        let total: f64 = self.weights.iter().sum();
        let mut n = ctx.rng().random_range(0.0..total);
        for (i, &w) in self.weights.iter().enumerate() {
            if n < w {
                return i;
            }
            n -= w;
        }

        // Rounding can leave `n` just past the last bucket.
        self.weights
            .iter()
            .rposition(|&w| w > 0.0)
            .unwrap_or(self.intervals.len() - 1)
    }

    /// Greedy online allocation: the first interval whose realized share has
    /// not yet exceeded its target wins. The counter is bumped before the
    /// interval generates, so a failing interval still counts as drawn.
    fn pick_percentage(&self) -> usize {
        let total = self.total.get();
        let mut bins = self.bins.borrow_mut();

        let share = |count: u64| {
            if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            }
        };

        let chosen = self
            .weights
            .iter()
            .zip(bins.iter())
            .position(|(&w, &count)| w > 0.0 && share(count) <= w / PERCENT_TOTAL)
            .unwrap_or_else(|| {
                // Largest deficit; only reachable through float rounding.
                let mut best = 0;
                let mut best_deficit = f64::MIN;
                for (i, (&w, &count)) in self.weights.iter().zip(bins.iter()).enumerate() {
                    let deficit = w / PERCENT_TOTAL - share(count);
                    if w > 0.0 && deficit > best_deficit {
                        best = i;
                        best_deficit = deficit;
                    }
                }
                best
            });

        bins[chosen] += 1;
        self.total.set(total + 1);
        chosen
    }

    /// Rejection sampling within `[min, max]`.
    ///
    /// mean is the midpoint of the bounds and the standard deviation the
    /// midpoint of mean and max. After `MAX_NORMAL_ATTEMPTS` rejections the
    /// last draw is clamped into range.
    fn sample_normal(&self, ctx: &mut GenContext) -> Value {
        let Some((min, max)) = self.bounds else {
            return Value::Null;
        };
        if min == max {
            return Value::Float(min);
        }

        let mean = (min + max) / 2.0;
        let mut std_dev = ((mean + max) / 2.0).abs();
        if std_dev == 0.0 {
            std_dev = (max - min) / 2.0;
        }

        let normal = match Normal::new(mean, std_dev) {
            Ok(normal) => normal,
            Err(_) => return Value::Float(mean),
        };

        let mut draw = mean;
        for _ in 0..MAX_NORMAL_ATTEMPTS {
            draw = normal.sample(ctx.rng());
            if (min..=max).contains(&draw) {
                return Value::Float(draw);
            }
        }

        warn!(min, max, "Normal distribution exhausted retries, clamping");
        Value::Float(draw.clamp(min, max))
    }
}

impl fmt::Debug for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Distribution")
            .field("kind", &self.kind)
            .field("intervals", &self.intervals)
            .field("weights", &self.weights)
            .field("bins", &*self.bins.borrow())
            .finish()
    }
}
