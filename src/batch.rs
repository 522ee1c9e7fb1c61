//! Parallel encoding of independent buffers.
//!
//! Architecture:
//! - Feeder thread: sends input indices into a bounded job channel
//! - Worker pool: each worker owns an [`Encoder`] and encodes whole inputs
//! - Calling thread: collects results and slots them back into input order
//!
//! Every input is encoded exactly as a standalone [`Encoder::encode`] call
//! would, so the output does not depend on the thread count.

use crossbeam::channel::{bounded, Receiver, Sender};

use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::EncodeConfig;

/// Resolve a requested thread count: 0 = one per CPU, capped at 32
pub fn effective_threads(requested: usize) -> usize {
    match requested {
        0 => num_cpus::get().clamp(1, 32),
        n => n.clamp(1, 32),
    }
}

/// Encode every buffer in `inputs` with `config`, returning the results in
/// input order. `threads == 0` picks one thread per CPU.
pub fn encode_batch(
    inputs: &[&[u8]],
    config: &EncodeConfig,
    threads: usize,
) -> Vec<Result<Vec<u8>>> {
    let encoder = Encoder::new(config.clone());
    let threads = effective_threads(threads).min(inputs.len().max(1));

    tracing::debug!(
        inputs = inputs.len(),
        threads,
        algorithm = config.algorithm.name(),
        "batch encode"
    );

    if threads == 1 {
        return inputs.iter().map(|src| encoder.encode(src)).collect();
    }

    let capacity = threads * 4;
    let (job_tx, job_rx): (Sender<usize>, Receiver<usize>) = bounded(capacity);
    let (result_tx, result_rx): (
        Sender<(usize, Result<Vec<u8>>)>,
        Receiver<(usize, Result<Vec<u8>>)>,
    ) = bounded(capacity);

    let mut slots: Vec<Option<Result<Vec<u8>>>> = (0..inputs.len()).map(|_| None).collect();

    let scoped = crossbeam::scope(|scope| {
        for _ in 0..threads {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let encoder = encoder.clone();

            scope.spawn(move |_| {
                for id in job_rx {
                    if result_tx.send((id, encoder.encode(inputs[id]))).is_err() {
                        break;
                    }
                }
            });
        }

        // Workers hold the only remaining copies, so the result channel
        // closes once the last of them exits
        drop(job_rx);
        drop(result_tx);

        scope.spawn(move |_| {
            for id in 0..inputs.len() {
                if job_tx.send(id).is_err() {
                    break;
                }
            }
        });

        for (id, result) in result_rx {
            slots[id] = Some(result);
        }
    });

    if scoped.is_err() {
        tracing::warn!("batch worker panicked");
    }

    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| {
                Err(Error::EncodeFailure("worker thread panicked".to_string()))
            })
        })
        .collect()
}
