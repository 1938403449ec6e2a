use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;

use crate::application::ports::{Embedder, EmbedderError, GpuMemory, ModelInfo};
use crate::domain::Embedding;

/// Memory figures reported when the device cannot be queried (CPU builds).
#[derive(Debug, Clone, Copy)]
pub struct MemoryProfile {
    pub total_mb: f64,
    pub model_mb: f64,
}

/// BERT-family sentence embedder running on the local GPU through Candle.
pub struct LocalCandleEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
    hidden_size: usize,
    profile: MemoryProfile,
}

impl LocalCandleEmbedder {
    pub fn new(
        model_id: &str,
        max_length: usize,
        profile: MemoryProfile,
    ) -> Result<Self, EmbedderError> {
        let device = Device::cuda_if_available(0)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("device: {}", e)))?;

        tracing::info!(
            device = ?device,
            model = model_id,
            "Initializing local Candle embedding model"
        );

        let api = Api::new().map_err(|e| EmbedderError::ModelLoadFailed(e.to_string()))?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("config.json: {}", e)))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("tokenizer.json: {}", e)))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("model.safetensors: {}", e)))?;

        let config_contents = std::fs::read_to_string(&config_path)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("read config: {}", e)))?;
        let config: BertConfig = serde_json::from_str(&config_contents)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("parse config: {}", e)))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("tokenizer: {}", e)))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: max_length.min(config.max_position_embeddings),
                ..Default::default()
            }))
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("truncation config: {}", e)))?;

        let dtype = select_dtype(&device);

        // SAFETY: safetensors files are memory-mapped read-only
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], dtype, &device)
                .map_err(|e| EmbedderError::ModelLoadFailed(format!("weights: {}", e)))?
        };

        let model = BertModel::load(vb, &config)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("model: {}", e)))?;

        tracing::info!(hidden_size = config.hidden_size, "Local Candle embedding model loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
            model_id: model_id.to_string(),
            hidden_size: config.hidden_size,
            profile,
        })
    }

    fn encode_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| EmbedderError::InferenceFailed(format!("tokenization: {}", e)))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut all_input_ids = Vec::with_capacity(texts.len() * max_len);
        let mut all_type_ids = Vec::with_capacity(texts.len() * max_len);
        let mut all_attention_mask = Vec::with_capacity(texts.len() * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let pad_len = max_len - ids.len();

            all_input_ids.extend_from_slice(ids);
            all_input_ids.extend(std::iter::repeat_n(0u32, pad_len));
            all_type_ids.extend_from_slice(encoding.get_type_ids());
            all_type_ids.extend(std::iter::repeat_n(0u32, pad_len));
            all_attention_mask.extend_from_slice(encoding.get_attention_mask());
            all_attention_mask.extend(std::iter::repeat_n(0u32, pad_len));
        }

        let shape = (texts.len(), max_len);
        let input_ids =
            Tensor::from_vec(all_input_ids, shape, &self.device).map_err(compute_error)?;
        let token_type_ids =
            Tensor::from_vec(all_type_ids, shape, &self.device).map_err(compute_error)?;
        let attention_mask =
            Tensor::from_vec(all_attention_mask, shape, &self.device).map_err(compute_error)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .and_then(|t| t.to_dtype(DType::F32))
            .map_err(compute_error)?;

        // Mean pooling over non-padding tokens
        let mask = attention_mask
            .to_dtype(DType::F32)
            .and_then(|m| m.unsqueeze(2))
            .map_err(compute_error)?;
        let summed = hidden
            .broadcast_mul(&mask)
            .and_then(|t| t.sum(1))
            .map_err(compute_error)?;
        let token_counts = mask.sum(1).map_err(compute_error)?;
        let pooled = summed.broadcast_div(&token_counts).map_err(compute_error)?;

        pooled.to_vec2::<f32>().map_err(compute_error)
    }
}

fn select_dtype(device: &Device) -> DType {
    if device.is_cpu() {
        DType::F32
    } else {
        DType::F16
    }
}

/// Wire name of a tensor dtype, in the `float32` style clients expect.
pub fn dtype_label(dtype: DType) -> &'static str {
    match dtype {
        DType::F16 => "float16",
        DType::BF16 => "bfloat16",
        DType::F32 => "float32",
        DType::F64 => "float64",
        other => other.as_str(),
    }
}

#[cfg(feature = "cuda")]
fn query_device_memory(device: &Device) -> Option<GpuMemory> {
    use candle_core::cuda_backend::cudarc::driver::result::mem_get_info;

    let Device::Cuda(cuda) = device else {
        return None;
    };
    if let Err(e) = cuda.bind_to_thread() {
        tracing::warn!(error = %e, "Could not bind CUDA context for memory query");
        return None;
    }
    match mem_get_info() {
        Ok((free, total)) => Some(GpuMemory::from_device_info(free, total)),
        Err(e) => {
            tracing::warn!(error = %e, "CUDA memory query failed");
            None
        }
    }
}

#[cfg(not(feature = "cuda"))]
fn query_device_memory(_device: &Device) -> Option<GpuMemory> {
    None
}

/// Candle surfaces CUDA allocation failures only through the error text.
fn compute_error(e: candle_core::Error) -> EmbedderError {
    let message = e.to_string();
    if message.to_lowercase().contains("out of memory") {
        EmbedderError::OutOfMemory(message)
    } else {
        EmbedderError::InferenceFailed(message)
    }
}

impl Embedder for LocalCandleEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.encode_texts(texts)?;
        Ok(vectors.into_iter().map(Embedding::normalized).collect())
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: self.model_id.clone(),
            dimensions: self.hidden_size,
            dtype: dtype_label(select_dtype(&self.device)).to_string(),
            device: if self.device.is_cuda() { "cuda" } else { "cpu" }.to_string(),
        }
    }

    fn memory(&self) -> GpuMemory {
        query_device_memory(&self.device).unwrap_or(GpuMemory {
            total_mb: self.profile.total_mb,
            allocated_mb: self.profile.model_mb,
            reserved_mb: self.profile.model_mb,
        })
    }

    fn release_cached_memory(&self) {
        // Candle frees device buffers as soon as tensors drop; nothing is cached.
        tracing::debug!("No cached device memory to release");
    }
}
