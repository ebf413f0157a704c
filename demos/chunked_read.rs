//! Write an array of `u32` to chunk files, then read it back with a group of
//! threads, each member reading its own slice of every batch.
//!
//! Input:
//!
//! * chunk file name root
//! * number of items
//! * number of items per chunk
//! * number of group members
//! * access mode: `serialized` (default) or `parallel`
//!
//! Usage:
//! ```ignore
//! RUST_LOG=debug cargo run --example chunked_read /tmp/array 1000 64 4 parallel
//! ```
use par_chunk_io::{
    run_in_threads, write_chunked, AccessMode, ChunkedFileHandle, ChunkedReader, CollectiveGroup,
    ReadConfig, ReadError,
};
use tracing_subscriber::EnvFilter;

const BATCH_PER_MEMBER: u64 = 50;

pub fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let root = std::env::args().nth(1).expect("Missing chunk file root");
    let num_items: u32 = std::env::args()
        .nth(2)
        .expect("Missing number of items")
        .parse()
        .expect("Wrong number of items format");
    let per_chunk: usize = std::env::args()
        .nth(3)
        .expect("Missing items per chunk")
        .parse()
        .expect("Wrong items per chunk format");
    let num_members: usize = std::env::args()
        .nth(4)
        .expect("Missing number of members")
        .parse()
        .expect("Wrong number of members format");
    let mode = match std::env::args().nth(5).as_deref() {
        None | Some("serialized") => AccessMode::Serialized,
        Some("parallel") => AccessMode::Parallel,
        Some(other) => panic!("Unknown access mode {}", other),
    };
    let data: Vec<u8> = (0..num_items).flat_map(|x| x.to_le_bytes()).collect();
    let table = write_chunked(&root, 4, &data, per_chunk, b"demo").expect("Cannot write chunks");
    println!("{} items in {} chunks", table.total_items(), table.len());

    let results = run_in_threads(num_members, |member| {
        let rank = member.rank() as u64;
        let reader = ChunkedReader::new(member, ReadConfig::new(mode));
        let mut handle = ChunkedFileHandle::open(root.as_str(), 4, table.clone())?;
        let mut buffer = vec![0_u8; BATCH_PER_MEMBER as usize * 4];
        let mut checksum = 0_u64;
        let mut total = 0;
        // every member calls `read` the same number of times
        while handle.cursor() < table.total_items() {
            let offset = rank * BATCH_PER_MEMBER;
            let n = reader.read(&mut handle, &mut buffer, offset, BATCH_PER_MEMBER)?;
            checksum += buffer[..n as usize * 4]
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as u64)
                .sum::<u64>();
            total += n;
        }
        Ok::<_, ReadError>((total, checksum))
    });
    let mut items = 0;
    let mut checksum = 0;
    for (rank, r) in results.into_iter().enumerate() {
        match r {
            Ok(Ok((n, sum))) => {
                println!("Member {}: {} items", rank, n);
                items += n;
                checksum += sum;
            }
            Ok(Err(err)) => eprintln!("Member {}: {}", rank, err),
            Err(_) => eprintln!("Member {} panicked", rank),
        }
    }
    let expected: u64 = (0..num_items as u64).sum();
    println!("{} items read, checksum {} (expected {})", items, checksum, expected);
    for i in 0..table.len() {
        let _ = std::fs::remove_file(par_chunk_io::chunk_path(&root, i));
    }
}
