//! Runs a decider over all machines of a [DataProvider], on one core or
//! fanned out over worker threads. Every machine is decided independently,
//! so the workers share nothing but the batch queue; the per-batch results
//! are merged in batch order, which keeps the emitted result stream
//! deterministic regardless of worker scheduling.

use std::sync::mpsc;
use std::time::Instant;

use crate::{
    config::CoreUsage,
    data_provider::{DataProvider, EndReason},
    decider::{
        decider_result::{BatchData, DeciderResultStats},
        DeciderConfig,
    },
    reporter::Reporter,
    utils::num_cpus_percentage,
};

/// Runs one decider over the data provider, single core.
pub fn run_decider_single(
    decider_config: &DeciderConfig,
    mut data_provider: impl DataProvider,
) -> DeciderResultStats {
    let start = Instant::now();
    let config = decider_config.config();
    let mut result = DeciderResultStats::new(config);
    let mut reporter = Reporter::new_default(data_provider.num_machines_to_process());

    loop {
        let batch = match data_provider.machine_batch_next() {
            Ok(batch) => batch,
            Err(e) => {
                eprintln!("{}: {e}", data_provider.name());
                break;
            }
        };
        let end_reason = batch.end_reason.clone();
        if end_reason == EndReason::NoMoreData {
            break;
        }

        let mut batch_data = BatchData::new(batch.batch_no, batch.machines, config);
        if let Err(reason) = (decider_config.f_decider())(&mut batch_data) {
            eprintln!("{}: batch ended: {reason}", decider_config.decider_id().name);
            break;
        }
        result.add_result(&batch_data.result);

        if reporter.is_due_progress() {
            println!("{}", reporter.report(result.num_total()));
        }
        if end_reason == EndReason::IsLastBatch {
            break;
        }
    }

    result.set_duration(start.elapsed());
    result
}

/// Runs one decider over the data provider on multiple worker threads. The
/// main thread reads the batches (file access stays sequential) and deals
/// them round-robin to the workers; results are collected and merged in
/// batch order.
pub fn run_decider_threaded(
    decider_config: &DeciderConfig,
    mut data_provider: impl DataProvider,
    num_workers: usize,
) -> DeciderResultStats {
    let start = Instant::now();
    let config = decider_config.config();
    let f_decider = decider_config.f_decider();
    let mut result = DeciderResultStats::new(config);
    let mut reporter = Reporter::new_default(data_provider.num_machines_to_process());

    let num_workers = num_workers.max(1);
    let (result_sender, result_receiver) = mpsc::channel::<(usize, DeciderResultStats)>();

    std::thread::scope(|scope| {
        let mut batch_senders = Vec::with_capacity(num_workers);
        for _ in 0..num_workers {
            let (batch_sender, batch_receiver) =
                mpsc::channel::<(usize, Vec<crate::machine_binary::MachineId>)>();
            batch_senders.push(batch_sender);
            let worker_result_sender = result_sender.clone();
            scope.spawn(move || {
                while let Ok((batch_no, machines)) = batch_receiver.recv() {
                    let mut batch_data = BatchData::new(batch_no, machines, config);
                    if let Err(reason) = f_decider(&mut batch_data) {
                        eprintln!("batch {batch_no} ended: {reason}");
                    }
                    if worker_result_sender
                        .send((batch_no, batch_data.result))
                        .is_err()
                    {
                        break;
                    }
                }
            });
        }
        // the scope owns a clone, the workers hold the rest
        drop(result_sender);

        let mut num_batches = 0usize;
        loop {
            let batch = match data_provider.machine_batch_next() {
                Ok(batch) => batch,
                Err(e) => {
                    eprintln!("{}: {e}", data_provider.name());
                    break;
                }
            };
            let end_reason = batch.end_reason.clone();
            if end_reason == EndReason::NoMoreData {
                break;
            }
            batch_senders[num_batches % num_workers]
                .send((batch.batch_no, batch.machines))
                .expect("worker thread lost");
            num_batches += 1;
            if end_reason == EndReason::IsLastBatch {
                break;
            }
        }
        // closing the channels lets the workers drain and exit
        drop(batch_senders);

        // merge in batch order for a deterministic result stream
        let mut worker_results: Vec<(usize, DeciderResultStats)> =
            result_receiver.iter().collect();
        worker_results.sort_by_key(|(batch_no, _)| *batch_no);
        for (_, batch_result) in worker_results {
            result.add_result(&batch_result);
            if reporter.is_due_progress() {
                println!("{}", reporter.report(result.num_total()));
            }
        }
    });

    result.set_duration(start.elapsed());
    result
}

/// Entry point choosing the core usage.
pub fn run_decider(
    decider_config: &DeciderConfig,
    data_provider: impl DataProvider,
    core_usage: CoreUsage,
) -> DeciderResultStats {
    match core_usage {
        CoreUsage::SingleCore => run_decider_single(decider_config, data_provider),
        CoreUsage::MultiCore => {
            let workers = num_cpus_percentage(decider_config.config().cpu_utilization_percent());
            run_decider_threaded(decider_config, data_provider, workers)
        }
    }
}
