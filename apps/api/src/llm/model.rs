//! Local T5 checkpoint loading and generation.
//!
//! The model directory must contain `config.json`, `tokenizer.json`, and
//! `model.safetensors` (a flan-t5-style seq2seq export). Weights are
//! memory-mapped; decoding is greedy with a repeat penalty over a trailing
//! token window.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::t5;
use tokenizers::Tokenizer;

use crate::llm::InferenceError;

const REPEAT_PENALTY: f32 = 1.1;
const REPEAT_LAST_N: usize = 64;
/// Seed for the logits processor. Decoding is greedy, so this only matters
/// if temperature sampling is ever switched on.
const DECODE_SEED: u64 = 299792458;

pub struct TextGenerator {
    model: Mutex<t5::T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    config: t5::Config,
    device: Device,
}

impl TextGenerator {
    /// Loads a seq2seq checkpoint from a local directory.
    pub fn load(dir: &Path) -> Result<Self> {
        let device = Device::Cpu;
        let config_path = dir.join("config.json");
        let tokenizer_path = dir.join("tokenizer.json");
        let weights_path = dir.join("model.safetensors");

        let config: t5::Config = serde_json::from_str(
            &std::fs::read_to_string(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?,
        )
        .context("parsing model config.json")?;

        let tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| anyhow!("loading tokenizer: {e}"))?;

        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)? };
        let model = t5::T5ForConditionalGeneration::load(vb, &config)
            .context("building T5 model from weights")?;

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            config,
            device,
        })
    }

    /// Runs one generation pass. Blocking; callers dispatch via
    /// `spawn_blocking`.
    pub fn generate(
        &self,
        prompt: &str,
        input_token_cap: usize,
        max_new_tokens: usize,
    ) -> Result<String, InferenceError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| InferenceError::Tokenizer(e.to_string()))?;
        let mut input_ids = encoding.get_ids().to_vec();
        truncate_to_window(&mut input_ids, input_token_cap, self.config.eos_token_id as u32);

        let mut model = self
            .model
            .lock()
            .map_err(|_| InferenceError::Generation("model lock poisoned".to_string()))?;
        model.clear_kv_cache();

        let input = Tensor::new(input_ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let encoder_output = model.encode(&input)?;

        let start_token = self
            .config
            .decoder_start_token_id
            .unwrap_or(self.config.pad_token_id) as u32;
        let mut output_ids = vec![start_token];
        let mut logits_processor = LogitsProcessor::new(DECODE_SEED, None, None);

        for index in 0..max_new_tokens {
            let decoder_tokens = if index == 0 || !self.config.use_cache {
                Tensor::new(output_ids.as_slice(), &self.device)?.unsqueeze(0)?
            } else {
                let last = output_ids[output_ids.len() - 1];
                Tensor::new(&[last], &self.device)?.unsqueeze(0)?
            };

            let logits = model.decode(&decoder_tokens, &encoder_output)?.squeeze(0)?;
            let start_at = output_ids.len().saturating_sub(REPEAT_LAST_N);
            let logits = candle_transformers::utils::apply_repeat_penalty(
                &logits,
                REPEAT_PENALTY,
                &output_ids[start_at..],
            )?;

            let next = logits_processor.sample(&logits)?;
            if next as usize == self.config.eos_token_id {
                break;
            }
            output_ids.push(next);
        }

        let text = self
            .tokenizer
            .decode(&output_ids[1..], true)
            .map_err(|e| InferenceError::Tokenizer(e.to_string()))?;
        let text = text.trim().to_string();

        if text.is_empty() {
            return Err(InferenceError::Generation(
                "model produced no text".to_string(),
            ));
        }
        Ok(text)
    }
}

/// Clamps an encoded prompt to the model's input window, keeping EOS as the
/// final token when truncation occurs.
fn truncate_to_window(ids: &mut Vec<u32>, cap: usize, eos_id: u32) {
    if ids.len() > cap {
        ids.truncate(cap);
        if let Some(last) = ids.last_mut() {
            *last = eos_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_noop_under_cap() {
        let mut ids = vec![10, 20, 30, 1];
        truncate_to_window(&mut ids, 8, 1);
        assert_eq!(ids, vec![10, 20, 30, 1]);
    }

    #[test]
    fn test_truncate_noop_at_cap() {
        let mut ids = vec![10, 20, 30, 1];
        truncate_to_window(&mut ids, 4, 1);
        assert_eq!(ids, vec![10, 20, 30, 1]);
    }

    #[test]
    fn test_truncate_replaces_last_token_with_eos() {
        let mut ids = vec![10, 20, 30, 40, 50, 1];
        truncate_to_window(&mut ids, 3, 1);
        assert_eq!(ids, vec![10, 20, 1]);
    }

    #[test]
    fn test_truncate_to_zero_cap() {
        let mut ids = vec![10, 20];
        truncate_to_window(&mut ids, 0, 1);
        assert!(ids.is_empty());
    }
}
