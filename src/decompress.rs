use crate::artifact::CompressedLog;
use crate::config::Config;
use crate::dictionary::Dictionary;
use crate::error::{Result, ScorepackError};
use crate::patch::apply_in_place;
use crate::sentinel::TickChain;
use crate::value::{Entry, Value};
use crate::wire;

/// Rebuild the original entry sequence.
///
/// The replay state keeps its markers; each output entry is resolved on a
/// copy. Any error aborts the whole decode.
pub fn decompress(log: &CompressedLog, config: &Config) -> Result<Vec<Entry>> {
    log.validate()?;
    let Some(baseline) = &log.baseline else {
        return Ok(Vec::new());
    };
    let layout = config.sentinels.as_ref();
    let dict = Dictionary::from_table(&log.dict)?;

    let mut state = wire::decode_value(&dict.expand_json(&baseline.data))
        .map_err(|e| at_step("baseline", e))?;
    let mut chain = TickChain::default();
    let mut out = Vec::with_capacity(log.entry_count());
    out.push(Entry {
        t: baseline.t.clone(),
        data: visible(&mut chain, layout, &state).map_err(|e| at_step("baseline", e))?,
    });

    for (i, step) in log.deltas.iter().enumerate() {
        if let Some(d) = &step.d {
            let delta = wire::decode_delta(&dict.expand_json(d), &state)
                .map_err(|e| at_step(&format!("step {i}"), e))?;
            apply_in_place(&mut state, &delta);
        }
        let data =
            visible(&mut chain, layout, &state).map_err(|e| at_step(&format!("step {i}"), e))?;
        out.push(Entry { t: step.t.clone(), data });
    }
    log::debug!("decompressed {} entries", out.len());
    Ok(out)
}

fn visible(
    chain: &mut TickChain,
    layout: Option<&crate::config::SentinelConfig>,
    state: &Value,
) -> Result<Value> {
    let resolved = chain.resolve(layout, state)?;
    if resolved.contains_marker() {
        return Err(ScorepackError::malformed("sentinel marker outside its field"));
    }
    Ok(resolved)
}

fn at_step(what: &str, err: ScorepackError) -> ScorepackError {
    match err {
        ScorepackError::MalformedArtifact(msg) => {
            ScorepackError::MalformedArtifact(format!("{what}: {msg}"))
        }
        other => other,
    }
}
