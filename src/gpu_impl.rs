use ocl::{Buffer, ProQue};
use tracing::{debug, trace, warn};

use crate::candidate::CandidateTable;
use crate::engine::{Reconstruction, SearchEngine, SearchJob, SearchOutcome};
use crate::flat::{dispatch_seed, work_item_key, FlatCandidateTable};
use crate::{EnpakkError, BLOCK_SIZE};

fn backend_err(e: ocl::Error) -> EnpakkError {
    EnpakkError::Backend(format!("{e}"))
}

/// GPU accelerated candidate search backed by OpenCL.
///
/// If no OpenCL platform can be initialized the engine runs the kernel's
/// work items on the CPU, so callers see the same contract either way.
/// Failures after initialization are reported as `Backend` errors.
pub struct GpuSearchEngine {
    pro_que: Option<ProQue>,
    grid: usize,
    seed: u64,
    dispatches: u64,
    flat: Option<FlatCandidateTable>,
    candidate_buf: Option<Buffer<u8>>,
    count_buf: Option<Buffer<u32>>,
    hashes: Vec<u8>,
    hash_buf: Option<Buffer<u8>>,
}

impl GpuSearchEngine {
    pub fn new(grid: usize, seed: u64) -> Self {
        let src = include_str!("kernels/brute_crc32.cl");
        let pro_que = match ProQue::builder().src(src).build() {
            Ok(pq) => Some(pq),
            Err(e) => {
                warn!("OpenCL unavailable, running kernel on the CPU: {e}");
                None
            }
        };
        Self {
            pro_que,
            grid: grid.max(1),
            seed,
            dispatches: 0,
            flat: None,
            candidate_buf: None,
            count_buf: None,
            hashes: Vec::new(),
            hash_buf: None,
        }
    }

    pub fn is_accelerated(&self) -> bool {
        self.pro_que.is_some()
    }

    /// Flatten `table` and upload it into device memory (if available).
    pub fn load_table(&mut self, table: &CandidateTable) -> Result<(), EnpakkError> {
        self.flat = None;
        self.candidate_buf = None;
        self.count_buf = None;
        let flat = FlatCandidateTable::from_table(table);
        if let Some(pq) = &self.pro_que {
            let q = pq.queue();
            let candidates = Buffer::<u8>::builder()
                .queue(q.clone())
                .len(flat.blocks().len())
                .copy_host_slice(flat.blocks())
                .build()
                .map_err(backend_err)?;
            let counts = Buffer::<u32>::builder()
                .queue(q.clone())
                .len(flat.counts().len())
                .copy_host_slice(flat.counts())
                .build()
                .map_err(backend_err)?;
            self.candidate_buf = Some(candidates);
            self.count_buf = Some(counts);
            debug!(bytes = flat.blocks().len(), "candidate table uploaded");
        }
        self.flat = Some(flat);
        Ok(())
    }

    fn load_hashes(&mut self, hashes: &[u8]) -> Result<(), EnpakkError> {
        if self.hash_buf.is_some() && self.hashes == hashes {
            return Ok(());
        }
        if let Some(pq) = &self.pro_que {
            self.hash_buf = Some(
                Buffer::<u8>::builder()
                    .queue(pq.queue().clone())
                    .len(hashes.len())
                    .copy_host_slice(hashes)
                    .build()
                    .map_err(backend_err)?,
            );
        }
        self.hashes = hashes.to_vec();
        Ok(())
    }

    fn cpu_dispatch(&self, job: &SearchJob<'_>, seed: u64) -> Result<SearchOutcome, EnpakkError> {
        let flat = self
            .flat
            .as_ref()
            .ok_or_else(|| EnpakkError::Backend("candidate table not loaded".into()))?;
        let mut out = Vec::with_capacity(job.hashes.len() * BLOCK_SIZE);
        for gid in 0..self.grid as u32 {
            let key = work_item_key(seed, gid);
            if flat.run_work_item(job.hashes, job.expected_checksum, key, &mut out) {
                return Ok(SearchOutcome::Found(Reconstruction::from_bytes(&out)));
            }
        }
        Ok(SearchOutcome::NotFound)
    }
}

impl SearchEngine for GpuSearchEngine {
    fn name(&self) -> &'static str {
        if self.is_accelerated() {
            "gpu-opencl"
        } else {
            "gpu-emulated"
        }
    }

    fn dispatch(&mut self, job: &SearchJob<'_>) -> Result<SearchOutcome, EnpakkError> {
        if self.flat.as_ref().map(FlatCandidateTable::stride) != Some(job.table.cap()) {
            self.load_table(job.table)?;
        }
        let seed = dispatch_seed(self.seed, self.dispatches);
        self.dispatches += 1;

        // no OpenCL platform
        let pq = match &self.pro_que {
            Some(p) => p.clone(),
            None => return self.cpu_dispatch(job, seed),
        };
        self.load_hashes(job.hashes)?;
        let (cand_buf, count_buf, hash_buf) =
            match (&self.candidate_buf, &self.count_buf, &self.hash_buf) {
                (Some(c), Some(n), Some(h)) => (c, n, h),
                _ => return Err(EnpakkError::Backend("device buffers not loaded".into())),
            };
        let stride = self.flat.as_ref().map_or(0, |f| f.stride()) as u32;

        let found = Buffer::<u32>::builder()
            .queue(pq.queue().clone())
            .len(1)
            .fill_val(0u32)
            .build()
            .map_err(backend_err)?;
        let result = Buffer::<u8>::builder()
            .queue(pq.queue().clone())
            .len(job.hashes.len() * BLOCK_SIZE)
            .build()
            .map_err(backend_err)?;

        let kernel = pq
            .kernel_builder("brute_crc32")
            .arg(hash_buf)
            .arg(job.hashes.len() as u32)
            .arg(cand_buf)
            .arg(count_buf)
            .arg(stride)
            .arg(job.expected_checksum)
            .arg(seed)
            .arg(&found)
            .arg(&result)
            .build()
            .map_err(backend_err)?;

        unsafe {
            kernel
                .cmd()
                .global_work_size(self.grid)
                .enq()
                .map_err(backend_err)?;
        }

        let mut flag = vec![0u32];
        found.read(&mut flag).enq().map_err(backend_err)?;
        trace!(dispatch = self.dispatches, found = flag[0], "opencl dispatch");
        if flag[0] == 0 {
            return Ok(SearchOutcome::NotFound);
        }
        let mut bytes = vec![0u8; job.hashes.len() * BLOCK_SIZE];
        result.read(&mut bytes).enq().map_err(backend_err)?;
        Ok(SearchOutcome::Found(Reconstruction::from_bytes(&bytes)))
    }

    fn reset(&mut self) {
        self.flat = None;
        self.candidate_buf = None;
        self.count_buf = None;
        self.hash_buf = None;
        self.hashes.clear();
    }
}
