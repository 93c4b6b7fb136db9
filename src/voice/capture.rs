use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

/// Samples per frame read.
pub const FRAME_SAMPLES: usize = 1024;

/* === Definitions === */

/// Blocking source of 16-bit mono PCM frames. Implementations sit on the
/// microphone side of the boundary; reads may block until audio arrives.
/// Returning zero samples ends the capture.
pub trait FrameSource: Send + 'static {
    fn read_frame(&mut self, frame: &mut [i16]) -> io::Result<usize>;
}

/// Reads raw little-endian PCM from a file or FIFO, typically fed by an
/// external recorder process.
pub struct FileSource {
    reader: BufReader<File>,
    bytes: Vec<u8>,
}

/* === Implementations === */

impl FileSource {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(FileSource {
            reader: BufReader::new(File::open(path)?),
            bytes: vec![0; 2 * FRAME_SAMPLES],
        })
    }
}

impl FrameSource for FileSource {
    fn read_frame(&mut self, frame: &mut [i16]) -> io::Result<usize> {
        let wanted = (2 * frame.len()).min(self.bytes.len());
        let read = self.reader.read(&mut self.bytes[..wanted])?;

        // An odd trailing byte cannot form a sample and is dropped
        let samples = read / 2;

        for (i, sample) in frame[..samples].iter_mut().enumerate() {
            *sample = i16::from_le_bytes([self.bytes[2 * i], self.bytes[2 * i + 1]]);
        }

        Ok(samples)
    }
}

/// Root-mean-square level of a frame, scaled to [0, 1].
pub fn level(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.;
    }

    let sum: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    let rms = (sum / samples.len() as f64).sqrt();

    (rms / f64::from(i16::MAX)) as f32
}

#[cfg(test)]
mod tests {
    use std::{env, fs, process};

    use super::*;

    #[test]
    fn test_file_source_reads_le_samples() {
        let path = env::temp_dir().join(format!("vento-capture-{}.pcm", process::id()));

        let samples: [i16; 4] = [0, 1000, -1000, i16::MAX];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        fs::write(&path, &bytes).unwrap();

        let mut source = FileSource::open(&path).unwrap();
        let mut frame = [0i16; FRAME_SAMPLES];

        assert_eq!(source.read_frame(&mut frame).unwrap(), 4);
        assert_eq!(&frame[..4], &samples);
        assert_eq!(source.read_frame(&mut frame).unwrap(), 0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_level_of_silence_and_tone() {
        assert_eq!(level(&[]), 0.);
        assert_eq!(level(&[0; 64]), 0.);

        let loud = [i16::MAX; 64];
        assert!((level(&loud) - 1.).abs() < 1e-3);
    }
}
