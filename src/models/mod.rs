// Raw counter readings handed from the counter source to the agents

mod cpu;
mod disk;
mod system;

pub use cpu::CpuTicks;
pub use disk::{DiskCounters, DiskSnapshot};
pub use system::{LoadAverage, MemoryUsage};
