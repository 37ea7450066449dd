use enpakk::{CandidateTable, EncodedStream, Reconstruction, SearchJob};
use honggfuzz::fuzz;

fn main() {
    let table = CandidateTable::with_cap(4);
    loop {
        fuzz!(|data: &[u8]| {
            if let Ok(stream) = EncodedStream::decode(data) {
                assert_eq!(stream.to_bytes(), data);
                // verification of an arbitrary guess must not panic
                let blocks = stream.hashes.iter().map(|&h| table.bucket(h)[0]).collect();
                let guess = Reconstruction::new(blocks);
                let job = SearchJob::new(&stream, &table);
                let _ = guess.verify(&job);
                assert_eq!(guess.to_bytes().len(), stream.output_len());
            }
        });
    }
}
