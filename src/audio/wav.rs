use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};

use super::TARGET_SAMPLE_RATE;

/// The layout written for decoded audio: mono, target rate, 16-bit PCM.
pub fn target_wav_spec() -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Sibling path the WAV is written to before it is moved into place.
pub fn partial_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.part", path.display()))
}

/// Write normalized `[-1.0, 1.0]` mono samples to `path` as 16-bit PCM WAV.
///
/// Out-of-range samples are clipped. The data goes to [`partial_path`] first and is fsynced and
/// renamed over `path` only once the header is finalized, so `path` either doesn't exist or is a
/// complete file, even if the process is killed mid-write. The partial file is removed on error.
pub fn write_wav(path: &Path, samples: &[f32]) -> Result<()> {
    let tmp_path = partial_path(path);

    let result = (|| -> Result<()> {
        let mut writer = WavWriter::create(&tmp_path, target_wav_spec())
            .with_context(|| format!("failed to create WAV file: {}", tmp_path.display()))?;

        for &sample in samples {
            let pcm = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
            writer.write_sample(pcm)?;
        }

        writer
            .finalize()
            .with_context(|| format!("failed to finalize WAV file: {}", tmp_path.display()))?;

        File::open(&tmp_path)
            .and_then(|file| file.sync_all())
            .with_context(|| format!("failed to sync WAV file: {}", tmp_path.display()))?;

        fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to move into place: {}", path.display()))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;

    #[test]
    fn writes_mono_16k_pcm_and_clips() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.wav");

        write_wav(&path, &[0.0, 0.5, -1.0, 2.0, -2.0])?;

        let mut reader = WavReader::open(&path)?;
        assert_eq!(reader.spec(), target_wav_spec());
        let pcm: Vec<i16> = reader.samples::<i16>().collect::<Result<_, _>>()?;
        assert_eq!(pcm, vec![0, 16384, -32767, 32767, -32767]);
        assert!(!partial_path(&path).exists());
        Ok(())
    }

    #[test]
    fn leftover_partial_file_is_replaced() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.wav");
        fs::write(partial_path(&path), b"RIFF\0\0\0\0WAVE")?;

        write_wav(&path, &[0.25; 160])?;

        assert_eq!(WavReader::open(&path)?.duration(), 160);
        assert!(!partial_path(&path).exists());
        Ok(())
    }

    #[test]
    fn failed_write_leaves_nothing_behind() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("missing-dir").join("out.wav");

        let err = write_wav(&path, &[0.0; 16]).unwrap_err();

        assert!(err.to_string().contains("failed to create WAV file"));
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
        Ok(())
    }
}
