use std::sync::Arc;

use cascade::ThreadedRuntime;
use cascade::ast::{Expr, call, ident, lambda, lit};
use cascade::config::EngineConfig;
use cascade::engine::Engine;
use cascade::error::{CascadeError, ErrorKind, Result};
use cascade::eval::evaluate;
use cascade::execution::map_task::{ChunkMapper, ChunkOutput};
use cascade::native_engine;
use cascade::runtime::PartitionRuntime;
use cascade::values::Value;
use cascade::vectors::chunk::Chunk;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn parallel_engine(chunk_size: usize) -> Engine {
    logutil::init_test();
    native_engine(EngineConfig {
        chunk_size,
        threads: 4,
        parallel: true,
    })
    .unwrap()
}

fn random_values(rng: &mut StdRng, len: usize) -> Vec<f64> {
    (0..len).map(|_| rng.random_range(-100.0..100.0)).collect()
}

/// `(+ (* x x) (sqrt (abs x)))`
fn test_formula() -> Expr {
    call(
        "+",
        [
            call("*", [ident("x"), ident("x")]),
            call("sqrt", [call("abs", [ident("x")])]),
        ],
    )
}

/// Counts elements equal to some value.
#[derive(Debug)]
struct CountEq(f64);

impl ChunkMapper for CountEq {
    type Partial = usize;

    fn produces_output(&self) -> bool {
        false
    }

    fn map_chunk(&self, _chunk_idx: usize, chunks: &[Chunk]) -> Result<ChunkOutput<usize>> {
        Ok(ChunkOutput {
            data: None,
            partial: chunks[0].values().iter().filter(|v| **v == self.0).count(),
        })
    }

    fn reduce(&self, a: usize, b: usize) -> usize {
        a + b
    }
}

#[test]
fn invert_zero_vector() {
    let engine = parallel_engine(1 << 14);
    let zeros = engine.zeros(1 << 20).unwrap();
    let env = engine.root_env().bind("v", Value::Vector(zeros));

    let inverted = engine
        .evaluate_in(
            &call("map", [lambda("x", call("-", [lit(1.0), ident("x")])), ident("v")]),
            &env,
        )
        .unwrap();
    let inverted = inverted.try_as_vector().unwrap().clone();
    assert!(inverted.is_lazy());

    let out = engine.for_each_chunk(vec![inverted], &CountEq(1.0)).unwrap();
    assert_eq!(Some(1 << 20), out.aggregate);
}

#[test]
fn lazy_matches_eager() {
    let engine = parallel_engine(37);
    let mut rng = StdRng::seed_from_u64(0xcafe);
    let values = random_values(&mut rng, 1000);

    let source = engine.vector_from_values(&values).unwrap();
    let derived = engine.derive(source, test_formula(), "x").unwrap();

    let eager: Vec<f64> = values
        .iter()
        .map(|&x| {
            let env = engine.root_env().bind("x", Value::Number(x));
            evaluate(&test_formula(), &env)
                .unwrap()
                .try_as_number()
                .unwrap()
        })
        .collect();

    assert_eq!(eager, engine.materialize(&derived, 0..1000).unwrap());

    // Arbitrary sub-ranges, some crossing chunk boundaries.
    for _ in 0..20 {
        let start = rng.random_range(0..1000);
        let end = rng.random_range(start..=1000);
        assert_eq!(
            eager[start..end].to_vec(),
            engine.materialize(&derived, start..end).unwrap()
        );
    }

    // Stored result matches too.
    let stored = engine.store_vector(derived).unwrap();
    assert_eq!(eager, engine.materialize(&stored, 0..1000).unwrap());
}

#[test]
fn chunks_independent() {
    let engine = parallel_engine(16);
    let mut rng = StdRng::seed_from_u64(42);
    let values = random_values(&mut rng, 250);

    let source = engine.vector_from_values(&values).unwrap();
    let derived = engine.derive(source, test_formula(), "x").unwrap();
    let expected = engine.materialize(&derived, 0..250).unwrap();

    let mut order: Vec<usize> = (0..derived.chunk_count()).collect();
    order.shuffle(&mut rng);

    let out = Mutex::new(vec![f64::NAN; 250]);
    let rt = ThreadedRuntime::try_new_with_num_threads(4).unwrap();
    rt.run_partitions(order.len(), &|idx| {
        let chunk = derived.read_chunk(order[idx]).unwrap();
        out.lock()[chunk.global_range()].copy_from_slice(chunk.values());
    })
    .unwrap();

    assert_eq!(expected, out.into_inner());
}

#[test]
fn conformance_checked_before_work() {
    #[derive(Debug, Default)]
    struct Calls(Mutex<usize>);

    impl ChunkMapper for Calls {
        type Partial = ();

        fn produces_output(&self) -> bool {
            true
        }

        fn map_chunk(&self, _chunk_idx: usize, chunks: &[Chunk]) -> Result<ChunkOutput<()>> {
            *self.0.lock() += 1;
            Ok(ChunkOutput {
                data: Some(chunks[0].values().to_vec()),
                partial: (),
            })
        }

        fn reduce(&self, _a: (), _b: ()) {}
    }

    let engine = parallel_engine(4);
    let a = engine.vector_from_values(&[1.0; 10]).unwrap();
    let b = engine.vector_from_values_with_chunk_size(&[1.0; 10], 5).unwrap();
    let before = engine.context().store().num_vectors();

    let calls = Calls::default();
    let err = engine
        .for_each_chunk(vec![a.clone(), b.clone()], &calls)
        .unwrap_err();

    assert_eq!(ErrorKind::ChunkConformance, err.kind());
    assert_eq!(0, *calls.0.lock());
    assert_eq!(before, engine.context().store().num_vectors());
}

#[test]
fn failed_chunk_publishes_nothing() {
    #[derive(Debug)]
    struct FailAt(usize);

    impl ChunkMapper for FailAt {
        type Partial = f64;

        fn produces_output(&self) -> bool {
            true
        }

        fn map_chunk(&self, chunk_idx: usize, chunks: &[Chunk]) -> Result<ChunkOutput<f64>> {
            if chunk_idx == self.0 {
                return Err(CascadeError::with_kind(
                    ErrorKind::TypeMismatch,
                    "refusing chunk",
                ));
            }
            Ok(ChunkOutput {
                data: Some(chunks[0].values().to_vec()),
                partial: chunks[0].values().iter().sum(),
            })
        }

        fn reduce(&self, a: f64, b: f64) -> f64 {
            a + b
        }
    }

    let engine = parallel_engine(8);
    let v = engine.zeros(128).unwrap();
    let before = engine.context().store().num_vectors();

    let err = engine
        .for_each_chunk(vec![v.clone()], &FailAt(5))
        .unwrap_err();
    assert_eq!(ErrorKind::ChunkCompute, err.kind());
    assert_eq!(ErrorKind::TypeMismatch, err.root_kind());
    assert_eq!(Some("5"), err.field("chunk"));
    assert_eq!(before, engine.context().store().num_vectors());

    // Same task without the failure succeeds.
    let out = engine
        .for_each_chunk(vec![v.clone()], &FailAt(usize::MAX))
        .unwrap();
    assert_eq!(Some(0.0), out.aggregate);
    assert_eq!(before + 1, engine.context().store().num_vectors());
}

#[test]
fn aggregate_reproducible_across_runtimes() {
    let mut rng = StdRng::seed_from_u64(7);
    let values = random_values(&mut rng, 5000);

    let sum_with = |parallel: bool| {
        let engine = native_engine(EngineConfig {
            chunk_size: 64,
            threads: 8,
            parallel,
        })
        .unwrap();
        let v = engine.vector_from_values(&values).unwrap();
        let env = engine.root_env().bind("v", Value::Vector(v));
        engine
            .evaluate_in(&call("sum", [call("*", [ident("v"), lit(3.0)])]), &env)
            .unwrap()
    };

    // Partials reduce in chunk order, so results are bit for bit equal.
    assert_eq!(sum_with(false), sum_with(true));
}

#[test]
fn derived_shares_formula() {
    let engine = parallel_engine(3);
    let formula = Arc::new(call("-", [lit(1.0), ident("x")]));

    let a = engine.vector_from_values(&[1.0, 2.0, 3.0]).unwrap();
    let b = engine.vector_from_values(&[4.0, 5.0]).unwrap();
    let da = engine.derive(a, formula.clone(), "x").unwrap();
    let db = engine.derive(b, formula, "x").unwrap();

    assert_eq!(vec![0.0, -1.0, -2.0], engine.materialize(&da, 0..3).unwrap());
    assert_eq!(vec![-3.0, -4.0], engine.materialize(&db, 0..2).unwrap());
}

#[test]
fn materialize_out_of_range() {
    let engine = parallel_engine(3);
    let v = engine.vector_from_values(&[1.0, 2.0]).unwrap();
    let d = engine.derive(v, call("neg", [ident("x")]), "x").unwrap();

    assert!(engine.materialize(&d, 2..2).unwrap().is_empty());
    let err = engine.materialize(&d, 1..3).unwrap_err();
    assert_eq!(ErrorKind::OutOfRange, err.kind());
}
