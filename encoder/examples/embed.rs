//! Run as `cargo run --example embed <kind> <model dir> [<query>] <sequence>...` with `<kind>`:
//! - `e` to embed the sequences
//! - `ce` to rank the sequences as candidates for the query

use encoder::Builder;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let kind = args.next().unwrap();
    let builder = Builder::from_dir(args.next().unwrap()).unwrap();

    match kind.as_str() {
        "e" => {
            let embedder = builder.build_embedder().unwrap();
            let sequences = args.collect::<Vec<_>>();
            for (sequence, embedding) in sequences
                .iter()
                .zip(embedder.embed_all(&sequences).unwrap())
            {
                println!("{}: {}", sequence, *embedding);
                assert_eq!(embedding.shape(), [embedder.embedding_size()]);
            }
        }
        "ce" => {
            let cross_encoder = builder.build_cross_encoder().unwrap();
            let query = args.next().unwrap();
            let candidates = args.collect::<Vec<_>>();
            for (candidate, score) in cross_encoder
                .score_and_rank(&query, &candidates, candidates.len())
                .unwrap()
            {
                println!("{:.4} {}", score, candidate);
            }
        }
        _ => panic!("unknown encoder kind"),
    }
}
