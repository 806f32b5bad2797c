use honggfuzz::fuzz;
use scorepack::{compress, decompress, parse_entries, CompressedLog, Config, IncrementalLogger};

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            let Ok(text) = std::str::from_utf8(data) else { return };
            let Ok(entries) = parse_entries(text) else { return };
            let config = Config::default();

            let expected = serde_json::to_string(&entries).expect("serialize");

            let log = compress(&entries, &config).expect("compress");
            let reparsed = CompressedLog::from_json(&log.to_json().expect("serialize")).expect("parse");
            let out = decompress(&reparsed, &config).expect("decompress");
            assert_eq!(serde_json::to_string(&out).expect("serialize"), expected);

            let mut logger = IncrementalLogger::new(config.clone());
            for e in &entries {
                logger.push(e).expect("push");
            }
            let out = decompress(&logger.finish(), &config).expect("decompress");
            assert_eq!(serde_json::to_string(&out).expect("serialize"), expected);
        });
    }
}
