use crate::artifact::{CompressedLog, Frame, Step};
use crate::config::Config;
use crate::delta::Delta;
use crate::dictionary::Dictionary;
use crate::diff::diff;
use crate::error::Result;
use crate::patch::apply_in_place;
use crate::sentinel::TickChain;
use crate::value::{Entry, Value};
use crate::wire;

/// Compress a full entry sequence in one pass.
///
/// The dictionary is ranked over the whole log, so this produces smaller
/// output than [`crate::IncrementalLogger`] for the same input.
pub fn compress(entries: &[Entry], config: &Config) -> Result<CompressedLog> {
    let Some((first, rest)) = entries.split_first() else {
        return Ok(CompressedLog::default());
    };
    let layout = config.sentinels.as_ref();

    let mut chain = TickChain::default();
    let baseline = chain.encode(layout, &first.data);
    let mut prev = baseline.clone();
    let mut deltas: Vec<Option<Delta>> = Vec::with_capacity(rest.len());
    for entry in rest {
        let curr = chain.encode(layout, &entry.data);
        let delta = diff(&prev, &curr);
        log::trace!("step {}: {} ops", deltas.len(), delta.as_ref().map_or(0, Delta::op_count));
        deltas.push(delta);
        prev = curr;
    }

    let dict = Dictionary::build(&baseline, deltas.iter().flatten())?;

    // Wire encoding needs the state each delta applies to, in shortened form.
    let mut shadow: Value = dict.shorten_value(&baseline);
    let frame = Frame {
        t: first.t.clone(),
        data: wire::encode_value(&shadow),
    };
    let steps = rest
        .iter()
        .zip(&deltas)
        .map(|(entry, delta)| {
            let d = delta.as_ref().map(|delta| {
                let short = dict.shorten_delta(delta);
                let json = wire::encode_delta(&short, &shadow);
                apply_in_place(&mut shadow, &short);
                json
            });
            Step { t: entry.t.clone(), d }
        })
        .collect::<Vec<_>>();

    let log = CompressedLog {
        dict: dict.table().clone(),
        baseline: Some(frame),
        deltas: steps,
        ..CompressedLog::default()
    };
    log::info!(
        "compressed {} entries: {} deltas, {} unchanged, {} dictionary codes",
        entries.len(),
        log.changed_steps(),
        rest.len() - log.changed_steps(),
        dict.len()
    );
    Ok(log)
}
