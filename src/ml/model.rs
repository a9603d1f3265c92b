// ============================================================
// Layer 5 — Bidirectional Model
// ============================================================
//
//   structure ─► structure_embedding ─┐                ┌─► spectrum_head ─► spectrum
//                                     ├─► SharedEncoder┤
//   spectrum  ─► spectrum_embedding  ─┘                └─► structure_head ─► structure
//
// The encoder is the only weight-sharing point: both directions
// run through the same blocks, which ties them to one latent
// space. Each feature vector is a single-token sequence
// [batch, 1, d_model], so attention has exactly one key.

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

use crate::domain::{direction::Direction, error::SpectraError};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct BidirectionalConfig {
    pub struct_dim:   usize,
    pub spectrum_dim: usize,
    #[config(default = 128)]
    pub d_model: usize,
    #[config(default = 8)]
    pub nhead: usize,
    #[config(default = 3)]
    pub num_layers: usize,
    #[config(default = 512)]
    pub dim_feedforward: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl BidirectionalConfig {
    /// Reject configurations Burn would panic on.
    pub fn validate(&self) -> Result<(), SpectraError> {
        let widths = [
            ("struct_dim",      self.struct_dim),
            ("spectrum_dim",    self.spectrum_dim),
            ("d_model",         self.d_model),
            ("nhead",           self.nhead),
            ("num_layers",      self.num_layers),
            ("dim_feedforward", self.dim_feedforward),
        ];
        if let Some((name, _)) = widths.iter().find(|(_, w)| *w == 0) {
            return Err(SpectraError::InvalidInput(format!("{name} must be greater than zero")));
        }
        if self.d_model % self.nhead != 0 {
            return Err(SpectraError::InvalidInput(format!(
                "d_model ({}) must be divisible by nhead ({})",
                self.d_model, self.nhead
            )));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(SpectraError::InvalidInput(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> BidirectionalModel<B> {
        let layers = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();

        BidirectionalModel {
            structure_embedding: LinearConfig::new(self.struct_dim, self.d_model).init(device),
            spectrum_head:       LinearConfig::new(self.d_model, self.spectrum_dim).init(device),
            spectrum_embedding:  LinearConfig::new(self.spectrum_dim, self.d_model).init(device),
            structure_head:      LinearConfig::new(self.d_model, self.struct_dim).init(device),
            encoder:             SharedEncoder { layers },
            struct_dim:          self.struct_dim,
            spectrum_dim:        self.spectrum_dim,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.nhead)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.dim_feedforward).init(device);
        let ffn_linear2 = LinearConfig::new(self.dim_feedforward, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

/// Post-norm transformer encoder layer.
#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let attn_output = self.self_attn.forward(MhaInput::self_attn(x.clone())).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

/// Encoder stack shared by both directions.
#[derive(Module, Debug)]
pub struct SharedEncoder<B: Backend> {
    pub layers: Vec<EncoderBlock<B>>,
}

impl<B: Backend> SharedEncoder<B> {
    /// latent: [batch, d_model] → [batch, d_model]
    pub fn forward(&self, latent: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch_size, d_model] = latent.dims();
        let mut x = latent.reshape([batch_size, 1, d_model]);
        for layer in &self.layers {
            x = layer.forward(x);
        }
        x.reshape([batch_size, d_model])
    }
}

#[derive(Module, Debug)]
pub struct BidirectionalModel<B: Backend> {
    pub structure_embedding: Linear<B>,
    pub spectrum_head:       Linear<B>,
    pub spectrum_embedding:  Linear<B>,
    pub structure_head:      Linear<B>,
    pub encoder:             SharedEncoder<B>,
    pub struct_dim:          usize,
    pub spectrum_dim:        usize,
}

/// A model input tagged with the space it lives in. The variant
/// decides the direction, so an input can never disagree with it.
#[derive(Debug, Clone)]
pub enum ModelInput<B: Backend> {
    Structure(Tensor<B, 2>),
    Spectrum(Tensor<B, 2>),
}

impl<B: Backend> ModelInput<B> {
    pub fn direction(&self) -> Direction {
        match self {
            ModelInput::Structure(_) => Direction::Forward,
            ModelInput::Spectrum(_)  => Direction::Reverse,
        }
    }
}

impl<B: Backend> BidirectionalModel<B> {
    /// structure: [batch, struct_dim] → spectrum: [batch, spectrum_dim]
    pub fn predict_forward(&self, structure: Tensor<B, 2>) -> Tensor<B, 2> {
        let latent = self.encoder.forward(self.structure_embedding.forward(structure));
        self.spectrum_head.forward(latent)
    }

    /// spectrum: [batch, spectrum_dim] → structure: [batch, struct_dim]
    pub fn predict_reverse(&self, spectrum: Tensor<B, 2>) -> Tensor<B, 2> {
        let latent = self.encoder.forward(self.spectrum_embedding.forward(spectrum));
        self.structure_head.forward(latent)
    }

    pub fn forward(&self, input: ModelInput<B>) -> Tensor<B, 2> {
        match input {
            ModelInput::Structure(x) => self.predict_forward(x),
            ModelInput::Spectrum(x)  => self.predict_reverse(x),
        }
    }

    /// Width the model expects on the input side of `direction`.
    pub fn input_width(&self, direction: Direction) -> usize {
        match direction {
            Direction::Forward => self.struct_dim,
            Direction::Reverse => self.spectrum_dim,
        }
    }

    /// Width the model produces on the output side of `direction`.
    pub fn output_width(&self, direction: Direction) -> usize {
        self.input_width(match direction {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        })
    }
}
