use honggfuzz::fuzz;
use scorepack::{decompress, CompressedLog, Config};

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            let Ok(text) = std::str::from_utf8(data) else { return };
            if let Ok(log) = CompressedLog::from_json(text) {
                let _ = decompress(&log, &Config::default());
                let _ = decompress(&log, &Config::without_sentinels());
            }
        });
    }
}
