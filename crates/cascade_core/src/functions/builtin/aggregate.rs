use cascade_error::Result;

use crate::execution::context::ExecutionContext;
use crate::execution::map_task::{ChunkMapper, ChunkOutput, MapTask};
use crate::functions::{Arity, Function};
use crate::values::Value;
use crate::vectors::chunk::Chunk;

pub const FUNCTION_SUM: Aggregate = Aggregate::new("sum", AggregateKind::Sum);
pub const FUNCTION_MEAN: Aggregate = Aggregate::new("mean", AggregateKind::Mean);
pub const FUNCTION_MIN: Aggregate = Aggregate::new("min", AggregateKind::Min);
pub const FUNCTION_MAX: Aggregate = Aggregate::new("max", AggregateKind::Max);

pub const AGGREGATE_FUNCTIONS: &[Aggregate] =
    &[FUNCTION_SUM, FUNCTION_MEAN, FUNCTION_MIN, FUNCTION_MAX];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Sum,
    Mean,
    Min,
    Max,
}

/// Reduces a vector to a single number. NaN elements are skipped.
///
/// Every chunk is visited by a map task producing partial stats, which are
/// then reduced.
#[derive(Debug, Clone, Copy)]
pub struct Aggregate {
    name: &'static str,
    kind: AggregateKind,
}

impl Aggregate {
    pub const fn new(name: &'static str, kind: AggregateKind) -> Self {
        Aggregate { name, kind }
    }

    pub fn kind(&self) -> AggregateKind {
        self.kind
    }
}

impl Function for Aggregate {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn call(&self, ctx: &ExecutionContext, args: Vec<Value>) -> Result<Value> {
        let vector = args[0].try_as_vector()?.clone();

        let out = MapTask::try_new(vec![vector])?.execute(ctx, &StatsMapper)?;
        let stats = out.aggregate.unwrap_or_default();

        if stats.count == 0 {
            return Ok(match self.kind {
                AggregateKind::Sum => Value::Number(0.0),
                _ => Value::Missing,
            });
        }

        let v = match self.kind {
            AggregateKind::Sum => stats.sum,
            AggregateKind::Mean => stats.sum / stats.count as f64,
            AggregateKind::Min => stats.min,
            AggregateKind::Max => stats.max,
        };

        Ok(Value::Number(v))
    }
}

/// Partial stats over the non-NaN values of some chunks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

#[derive(Debug)]
struct StatsMapper;

impl ChunkMapper for StatsMapper {
    type Partial = Stats;

    fn produces_output(&self) -> bool {
        false
    }

    fn map_chunk(&self, _chunk_idx: usize, chunks: &[Chunk]) -> Result<ChunkOutput<Stats>> {
        let mut stats = Stats::default();
        for &v in chunks[0].values().iter().filter(|v| !v.is_nan()) {
            stats.count += 1;
            stats.sum += v;
            stats.min = stats.min.min(v);
            stats.max = stats.max.max(v);
        }

        Ok(ChunkOutput {
            data: None,
            partial: stats,
        })
    }

    fn reduce(&self, a: Stats, b: Stats) -> Stats {
        Stats {
            count: a.count + b.count,
            sum: a.sum + b.sum,
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }
}
