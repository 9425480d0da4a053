use std::sync::atomic::{AtomicBool, Ordering};

use cascade_error::{CascadeError, ErrorKind, Result};
use parking_lot::Mutex;
use tracing::{debug, debug_span, trace};

use super::context::ExecutionContext;
use crate::vectors::VectorRef;
use crate::vectors::chunk::Chunk;
use crate::vectors::layout::ChunkLayout;
use crate::vectors::partitioned::PartitionedVector;

/// Result of mapping a single chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkOutput<P> {
    /// Values of the output chunk. Must be set if and only if the mapper
    /// produces output.
    pub data: Option<Vec<f64>>,
    pub partial: P,
}

/// Per-chunk computation run by a map task.
///
/// `map_chunk` for one chunk must only depend on the input chunks it's given.
/// It may be called concurrently for different chunks.
pub trait ChunkMapper: Sync {
    /// Partial aggregate produced for every chunk.
    type Partial: Send;

    /// If this mapper produces an output vector.
    fn produces_output(&self) -> bool;

    /// Map the input chunks at `chunk_idx`.
    ///
    /// `chunks` holds one chunk per input vector, in input order.
    fn map_chunk(&self, chunk_idx: usize, chunks: &[Chunk]) -> Result<ChunkOutput<Self::Partial>>;

    /// Combine two partial aggregates. Must be associative and commutative.
    fn reduce(&self, a: Self::Partial, b: Self::Partial) -> Self::Partial;
}

/// Output of a successfully completed map task.
#[derive(Debug)]
pub struct MapOutput<P> {
    /// The output vector if the mapper produces output.
    pub vector: Option<VectorRef>,
    /// Reduced partials, None if there were no chunks.
    pub aggregate: Option<P>,
}

/// Runs a chunk mapper once for every chunk of a set of conformed vectors.
#[derive(Debug)]
pub struct MapTask {
    inputs: Vec<VectorRef>,
    layout: ChunkLayout,
}

impl MapTask {
    /// Create a new task over `inputs`.
    ///
    /// Every input must have the same layout.
    pub fn try_new(inputs: Vec<VectorRef>) -> Result<Self> {
        let Some(first) = inputs.first() else {
            return Err(CascadeError::with_kind(
                ErrorKind::ChunkConformance,
                "Map task requires at least one input vector",
            ));
        };
        let layout = first.layout().clone();

        for (idx, input) in inputs.iter().enumerate().skip(1) {
            if !input.layout().conforms(&layout) {
                return Err(CascadeError::with_kind(
                    ErrorKind::ChunkConformance,
                    "Input vectors are not conformed",
                )
                .with_field("input", idx)
                .with_field("expected_len", layout.len())
                .with_field("actual_len", input.len())
                .with_field("expected_chunks", layout.chunk_count())
                .with_field("actual_chunks", input.chunk_count()));
            }
        }

        Ok(MapTask { inputs, layout })
    }

    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    pub fn inputs(&self) -> &[VectorRef] {
        &self.inputs
    }

    /// Execute the task to completion.
    ///
    /// If any chunk fails the task fails with the error from the lowest failing
    /// chunk index, and nothing written by other chunks is kept.
    pub fn execute<M>(&self, ctx: &ExecutionContext, mapper: &M) -> Result<MapOutput<M::Partial>>
    where
        M: ChunkMapper,
    {
        let chunk_count = self.layout.chunk_count();
        let span = debug_span!("map_task", chunks = chunk_count, inputs = self.inputs.len());
        let _guard = span.enter();

        // Held by this handle until every chunk is written. Dropping it on any
        // error path removes the partially written vector from the store.
        let output = if mapper.produces_output() {
            let key = ctx.store().allocate(&self.layout)?;
            Some(PartitionedVector::from_written(
                ctx.store().clone(),
                key,
                self.layout.clone(),
            ))
        } else {
            None
        };

        let state = TaskState {
            aborted: AtomicBool::new(false),
            failure: Mutex::new(None),
            partials: Mutex::new((0..chunk_count).map(|_| None).collect()),
        };

        let work = |chunk_idx: usize| {
            if state.aborted.load(Ordering::Relaxed) {
                trace!(%chunk_idx, "skipping chunk after abort");
                return;
            }

            match self.run_chunk(ctx, mapper, output.as_ref(), chunk_idx) {
                Ok(partial) => state.partials.lock()[chunk_idx] = Some(partial),
                Err(error) => {
                    debug!(%chunk_idx, %error, "chunk failed");
                    state.aborted.store(true, Ordering::Relaxed);
                    state.set_failure(chunk_idx, error);
                }
            }
        };

        ctx.runtime().run_partitions(chunk_count, &work)?;

        if let Some((chunk_idx, error)) = state.failure.into_inner() {
            return Err(CascadeError::with_kind(
                ErrorKind::ChunkCompute,
                "Failed to compute chunk",
            )
            .with_field("chunk", chunk_idx)
            .caused_by(error));
        }

        // Reduce in chunk order so the result doesn't depend on which chunk
        // finished first.
        let mut aggregate = None;
        for (chunk_idx, partial) in state.partials.into_inner().into_iter().enumerate() {
            let partial = partial.ok_or_else(|| {
                CascadeError::new("Chunk completed without a partial result")
                    .with_field("chunk", chunk_idx)
            })?;
            aggregate = Some(match aggregate {
                Some(acc) => mapper.reduce(acc, partial),
                None => partial,
            });
        }

        debug!("map task complete");

        Ok(MapOutput {
            vector: output.map(VectorRef::from),
            aggregate,
        })
    }

    fn run_chunk<M>(
        &self,
        ctx: &ExecutionContext,
        mapper: &M,
        output: Option<&PartitionedVector>,
        chunk_idx: usize,
    ) -> Result<M::Partial>
    where
        M: ChunkMapper,
    {
        let chunks = self
            .inputs
            .iter()
            .map(|input| input.read_chunk(chunk_idx))
            .collect::<Result<Vec<_>>>()?;

        let out = mapper.map_chunk(chunk_idx, &chunks)?;

        match (output, out.data) {
            (Some(output), Some(data)) => {
                let expected = self.layout.chunk_len(chunk_idx)?;
                if data.len() != expected {
                    return Err(CascadeError::with_kind(
                        ErrorKind::ChunkCompute,
                        "Output chunk length does not match input chunk length",
                    )
                    .with_field("expected", expected)
                    .with_field("actual", data.len()));
                }
                ctx.store().write_chunk(output.key(), chunk_idx, data)?;
            }
            (Some(_), None) => {
                return Err(CascadeError::with_kind(
                    ErrorKind::ChunkCompute,
                    "Mapper produced no data for an output chunk",
                ));
            }
            (None, Some(_)) => {
                return Err(CascadeError::new(
                    "Mapper produced data for a task without an output vector",
                ));
            }
            (None, None) => (),
        }

        Ok(out.partial)
    }
}

#[derive(Debug)]
struct TaskState<P> {
    aborted: AtomicBool,
    /// First failure by chunk index.
    failure: Mutex<Option<(usize, CascadeError)>>,
    partials: Mutex<Vec<Option<P>>>,
}

impl<P> TaskState<P> {
    fn set_failure(&self, chunk_idx: usize, error: CascadeError) {
        let mut failure = self.failure.lock();
        match failure.as_ref() {
            Some((existing, _)) if *existing < chunk_idx => (),
            _ => *failure = Some((chunk_idx, error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    /// Adds all inputs element-wise, and sums every output element.
    #[derive(Debug, Default)]
    struct AddMapper {
        calls: AtomicUsize,
    }

    impl ChunkMapper for AddMapper {
        type Partial = f64;

        fn produces_output(&self) -> bool {
            true
        }

        fn map_chunk(&self, _chunk_idx: usize, chunks: &[Chunk]) -> Result<ChunkOutput<f64>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let mut out = vec![0.0; chunks[0].len()];
            for chunk in chunks {
                for (dst, src) in out.iter_mut().zip(chunk.values()) {
                    *dst += src;
                }
            }
            let partial = out.iter().sum();
            Ok(ChunkOutput {
                data: Some(out),
                partial,
            })
        }

        fn reduce(&self, a: f64, b: f64) -> f64 {
            a + b
        }
    }

    /// Fails on a single chunk.
    #[derive(Debug)]
    struct FailAt {
        chunk: usize,
        calls: AtomicUsize,
    }

    impl ChunkMapper for FailAt {
        type Partial = ();

        fn produces_output(&self) -> bool {
            true
        }

        fn map_chunk(&self, chunk_idx: usize, chunks: &[Chunk]) -> Result<ChunkOutput<()>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if chunk_idx == self.chunk {
                return Err(CascadeError::with_kind(ErrorKind::TypeMismatch, "bad chunk"));
            }
            Ok(ChunkOutput {
                data: Some(chunks[0].values().to_vec()),
                partial: (),
            })
        }

        fn reduce(&self, _a: (), _b: ()) {}
    }

    #[test]
    fn add_two_vectors() {
        let ctx = ExecutionContext::inline();
        let a = ctx.vector_from_values(&[1.0, 2.0, 3.0, 4.0, 5.0], 2).unwrap();
        let b = ctx.vector_from_values(&[10.0, 20.0, 30.0, 40.0, 50.0], 2).unwrap();

        let mapper = AddMapper::default();
        let out = MapTask::try_new(vec![a, b])
            .unwrap()
            .execute(&ctx, &mapper)
            .unwrap();

        let vector = out.vector.unwrap();
        assert!(!vector.is_lazy());
        assert_eq!(vec![11.0, 22.0, 33.0, 44.0, 55.0], vector.materialize(0..5).unwrap());
        assert_eq!(Some(165.0), out.aggregate);
        assert_eq!(3, mapper.calls.load(Ordering::Relaxed));
    }

    #[test]
    fn rejects_unconformed_inputs() {
        let ctx = ExecutionContext::inline();
        let a = ctx.vector_from_values(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        let b = ctx.vector_from_values(&[1.0, 2.0, 3.0, 4.0], 3).unwrap();

        let err = MapTask::try_new(vec![a, b]).unwrap_err();
        assert_eq!(ErrorKind::ChunkConformance, err.kind());
        assert_eq!(Some("1"), err.field("input"));
    }

    #[test]
    fn rejects_different_lengths() {
        let ctx = ExecutionContext::inline();
        let a = ctx.vector_from_values(&[1.0, 2.0, 3.0], 2).unwrap();
        let b = ctx.vector_from_values(&[1.0, 2.0], 2).unwrap();

        let err = MapTask::try_new(vec![a, b]).unwrap_err();
        assert_eq!(ErrorKind::ChunkConformance, err.kind());
    }

    #[test]
    fn rejects_no_inputs() {
        let err = MapTask::try_new(Vec::new()).unwrap_err();
        assert_eq!(ErrorKind::ChunkConformance, err.kind());
    }

    #[test]
    fn failure_publishes_nothing() {
        let ctx = ExecutionContext::inline();
        let a = ctx.vector_from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 2).unwrap();
        let before = ctx.store().num_vectors();

        let mapper = FailAt {
            chunk: 2,
            calls: AtomicUsize::new(0),
        };
        let err = MapTask::try_new(vec![a.clone()])
            .unwrap()
            .execute(&ctx, &mapper)
            .unwrap_err();

        assert_eq!(ErrorKind::ChunkCompute, err.kind());
        assert_eq!(ErrorKind::TypeMismatch, err.root_kind());
        assert_eq!(Some("2"), err.field("chunk"));
        assert_eq!(before, ctx.store().num_vectors());
        // Chunk 3 skipped after the abort.
        assert_eq!(3, mapper.calls.load(Ordering::Relaxed));
    }

    #[test]
    fn output_length_checked() {
        #[derive(Debug)]
        struct Truncate;

        impl ChunkMapper for Truncate {
            type Partial = ();

            fn produces_output(&self) -> bool {
                true
            }

            fn map_chunk(
                &self,
                _chunk_idx: usize,
                chunks: &[Chunk],
            ) -> Result<ChunkOutput<()>> {
                Ok(ChunkOutput {
                    data: Some(chunks[0].values()[1..].to_vec()),
                    partial: (),
                })
            }

            fn reduce(&self, _a: (), _b: ()) {}
        }

        let ctx = ExecutionContext::inline();
        let a = ctx.vector_from_values(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        let err = MapTask::try_new(vec![a.clone()])
            .unwrap()
            .execute(&ctx, &Truncate)
            .unwrap_err();

        assert_eq!(ErrorKind::ChunkCompute, err.kind());
        // Only the input remains.
        assert_eq!(1, ctx.store().num_vectors());
        assert_eq!(vec![1.0, 2.0, 3.0, 4.0], a.materialize(0..4).unwrap());
    }

    #[test]
    fn aggregate_only() {
        #[derive(Debug)]
        struct Count;

        impl ChunkMapper for Count {
            type Partial = usize;

            fn produces_output(&self) -> bool {
                false
            }

            fn map_chunk(
                &self,
                _chunk_idx: usize,
                chunks: &[Chunk],
            ) -> Result<ChunkOutput<usize>> {
                Ok(ChunkOutput {
                    data: None,
                    partial: chunks[0].len(),
                })
            }

            fn reduce(&self, a: usize, b: usize) -> usize {
                a + b
            }
        }

        let ctx = ExecutionContext::inline();
        let a = ctx.vector_from_values(&[0.0; 11], 4).unwrap();
        let out = MapTask::try_new(vec![a])
            .unwrap()
            .execute(&ctx, &Count)
            .unwrap();

        assert!(out.vector.is_none());
        assert_eq!(Some(11), out.aggregate);
    }

    #[test]
    fn empty_vector() {
        let ctx = ExecutionContext::inline();
        let a = ctx.vector_from_values(&[], 4).unwrap();
        let out = MapTask::try_new(vec![a])
            .unwrap()
            .execute(&ctx, &AddMapper::default())
            .unwrap();

        assert_eq!(None, out.aggregate);
        assert_eq!(0, out.vector.unwrap().len());
    }
}
