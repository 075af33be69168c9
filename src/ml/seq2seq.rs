// ============================================================
// Layer 5 — Attention Seq2Seq Translator
// ============================================================
// An encoder-decoder network with dot-product attention.
//
//   encoder_inputs [B, Te]
//     → Embedding                        [B, Te, H]
//     → num_layers stacked GRUs          [B, Te, H]  (encoder outputs)
//                                         + final state of every layer
//
//   decoder_inputs [B, Td]
//     → Embedding                        [B, Td, H]
//     → num_layers stacked GRUs, each starting from the final
//       state of the matching encoder layer      [B, Td, H]
//     → attention: scores = dec · encᵀ   [B, Td, Te]
//                  weights = softmax over Te
//                  context = weights · enc        [B, Td, H]
//     → tanh(Linear([context ; dec]))    [B, Td, H]
//     → Linear projection                [B, Td, V_dec] logits
//
// Training runs the decoder over the whole (teacher-forced)
// decoder input at once. Greedy decoding runs the same cells one
// step at a time via `encode` + `decode_step`, feeding back the
// previous prediction.
//
// Reference: Cho et al. (2014) GRU
//            Luong et al. (2015) Effective Approaches to
//            Attention-based Neural Machine Translation

use burn::{
    nn::{Embedding, EmbeddingConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::{log_softmax, sigmoid, softmax},
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub encoder_vocab_size: usize,
    pub decoder_vocab_size: usize,
    #[config(default = 256)]
    pub hidden_size: usize,
    #[config(default = 3)]
    pub num_layers: usize,
}

impl Seq2SeqConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2Seq<B> {
        let h = self.hidden_size;
        let stack = |device: &B::Device| -> Vec<GruCell<B>> {
            (0..self.num_layers).map(|_| GruCell::new(h, h, device)).collect()
        };
        Seq2Seq {
            encoder_embedding: EmbeddingConfig::new(self.encoder_vocab_size, h).init(device),
            encoder_layers: stack(device),
            decoder_embedding: EmbeddingConfig::new(self.decoder_vocab_size, h).init(device),
            decoder_layers: stack(device),
            attention_combine: LinearConfig::new(2 * h, h).init(device),
            projection: LinearConfig::new(h, self.decoder_vocab_size).init(device),
        }
    }
}

// ─── GruCell ──────────────────────────────────────────────────────────────────
/// One GRU layer, stepped manually so the decoder can run either
/// over a whole sequence or one token at a time.
///
///   r  = σ(W_r x + U_r h)
///   z  = σ(W_z x + U_z h)
///   n  = tanh(W_n x + r ⊙ (U_n h))
///   h' = (1 - z) ⊙ n + z ⊙ h
#[derive(Module, Debug)]
pub struct GruCell<B: Backend> {
    pub input_gates: Linear<B>,
    pub hidden_gates: Linear<B>,
    pub hidden_size: usize,
}

impl<B: Backend> GruCell<B> {
    pub fn new(d_input: usize, d_hidden: usize, device: &B::Device) -> Self {
        Self {
            input_gates: LinearConfig::new(d_input, 3 * d_hidden).init(device),
            hidden_gates: LinearConfig::new(d_hidden, 3 * d_hidden).init(device),
            hidden_size: d_hidden,
        }
    }

    /// x: [B, D], h: [B, H] → [B, H]
    pub fn step(&self, x: Tensor<B, 2>, h: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, _] = x.dims();
        let hs = self.hidden_size;
        let gi = self.input_gates.forward(x);
        let gh = self.hidden_gates.forward(h.clone());

        let gate = |t: &Tensor<B, 2>, k: usize| t.clone().slice([0..batch, k * hs..(k + 1) * hs]);

        let r = sigmoid(gate(&gi, 0) + gate(&gh, 0));
        let z = sigmoid(gate(&gi, 1) + gate(&gh, 1));
        let n = (gate(&gi, 2) + r * gate(&gh, 2)).tanh();

        z.clone().neg().add_scalar(1.0) * n + z * h
    }

    /// xs: [B, T, D], h0: [B, H] → (all states [B, T, H], final state [B, H])
    pub fn forward(&self, xs: Tensor<B, 3>, h0: Tensor<B, 2>) -> (Tensor<B, 3>, Tensor<B, 2>) {
        let [batch, steps, d_input] = xs.dims();
        let mut h = h0;
        let mut outputs = Vec::with_capacity(steps);
        for t in 0..steps {
            let x_t = xs.clone().slice([0..batch, t..t + 1, 0..d_input]).reshape([batch, d_input]);
            h = self.step(x_t, h);
            outputs.push(h.clone().reshape([batch, 1, self.hidden_size]));
        }
        (Tensor::cat(outputs, 1), h)
    }
}

// ─── Seq2Seq ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Seq2Seq<B: Backend> {
    pub encoder_embedding: Embedding<B>,
    pub encoder_layers: Vec<GruCell<B>>,
    pub decoder_embedding: Embedding<B>,
    pub decoder_layers: Vec<GruCell<B>>,
    pub attention_combine: Linear<B>,
    pub projection: Linear<B>,
}

/// What the decoder needs from the encoder
#[derive(Debug, Clone)]
pub struct EncoderState<B: Backend> {
    /// [B, Te, H]
    pub outputs: Tensor<B, 3>,
    /// Final hidden state of every layer, each [B, H]
    pub states: Vec<Tensor<B, 2>>,
}

impl<B: Backend> Seq2Seq<B> {
    /// encoder_inputs: [B, Te] → outputs and per-layer final states
    pub fn encode(&self, encoder_inputs: Tensor<B, 2, Int>) -> EncoderState<B> {
        let [batch, _] = encoder_inputs.dims();
        let mut x = self.encoder_embedding.forward(encoder_inputs);
        let mut states = Vec::with_capacity(self.encoder_layers.len());
        for layer in &self.encoder_layers {
            let h0 = Tensor::zeros([batch, layer.hidden_size], &x.device());
            let (out, last) = layer.forward(x, h0);
            states.push(last);
            x = out;
        }
        EncoderState { outputs: x, states }
    }

    /// Teacher-forced pass over the whole decoder input.
    /// encoder_inputs: [B, Te], decoder_inputs: [B, Td] → logits [B, Td, V]
    pub fn forward(
        &self,
        encoder_inputs: Tensor<B, 2, Int>,
        decoder_inputs: Tensor<B, 2, Int>,
    ) -> Tensor<B, 3> {
        let encoded = self.encode(encoder_inputs);
        let mut y = self.decoder_embedding.forward(decoder_inputs);
        for (layer, h0) in self.decoder_layers.iter().zip(encoded.states) {
            y = layer.forward(y, h0).0;
        }
        self.attend_and_project(y, encoded.outputs)
    }

    /// One greedy step.
    /// tokens: [B] previous outputs, states: decoder state per layer
    /// → (logits [B, V], new states)
    pub fn decode_step(
        &self,
        tokens: Tensor<B, 1, Int>,
        states: Vec<Tensor<B, 2>>,
        encoder_outputs: Tensor<B, 3>,
    ) -> (Tensor<B, 2>, Vec<Tensor<B, 2>>) {
        let [batch] = tokens.dims();
        let embedded = self.decoder_embedding.forward(tokens.reshape([batch, 1]));
        let [_, _, d] = embedded.dims();
        let mut x = embedded.reshape([batch, d]);

        let mut next_states = Vec::with_capacity(states.len());
        for (layer, h) in self.decoder_layers.iter().zip(states) {
            x = layer.step(x, h);
            next_states.push(x.clone());
        }

        let hidden = x.dims()[1];
        let logits = self.attend_and_project(x.reshape([batch, 1, hidden]), encoder_outputs);
        let vocab = logits.dims()[2];
        (logits.reshape([batch, vocab]), next_states)
    }

    /// Dot-product attention over encoder outputs, tanh combine, project.
    fn attend_and_project(&self, dec: Tensor<B, 3>, enc: Tensor<B, 3>) -> Tensor<B, 3> {
        let scores = dec.clone().matmul(enc.clone().swap_dims(1, 2)); // [B, Td, Te]
        let weights = softmax(scores, 2);
        let context = weights.matmul(enc); // [B, Td, H]
        let combined = self
            .attention_combine
            .forward(Tensor::cat(vec![context, dec], 2))
            .tanh();
        self.projection.forward(combined)
    }
}

// ─── Loss ─────────────────────────────────────────────────────────────────────
/// Mask-weighted cross-entropy.
///
/// For every example: Σ_t mask·ce / (Σ_t mask + 1e-12), then the
/// mean over the batch. logits [B, T, V], targets [B, T], masks [B, T].
pub fn masked_sequence_loss<B: Backend>(
    logits: Tensor<B, 3>,
    targets: Tensor<B, 2, Int>,
    masks: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let [batch, steps, _] = logits.dims();
    let log_probs = log_softmax(logits, 2);
    let picked = log_probs
        .gather(2, targets.reshape([batch, steps, 1]))
        .reshape([batch, steps]);
    let cross_entropy = picked.neg();

    let weighted = (cross_entropy * masks.clone()).sum_dim(1).reshape([batch]);
    let total_weight = masks.sum_dim(1).reshape([batch]).add_scalar(1e-12);
    (weighted / total_weight).mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::module::AutodiffModule;
    use burn::optim::{GradientsParams, Optimizer, SgdConfig};

    type TestBackend = NdArray;

    fn tiny_config() -> Seq2SeqConfig {
        Seq2SeqConfig::new(12, 9).with_hidden_size(8).with_num_layers(2)
    }

    fn ints(values: &[i32], shape: [usize; 2]) -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 1, Int>::from_ints(values, &Default::default()).reshape(shape)
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model = tiny_config().init::<TestBackend>(&device);
        let logits = model.forward(ints(&[4, 5, 6, 0, 0, 7], [2, 3]), ints(&[2, 8, 3, 0, 2, 3, 0, 0], [2, 4]));
        assert_eq!(logits.dims(), [2, 4, 9]);
    }

    #[test]
    fn test_stepwise_decoding_matches_full_pass() {
        let device = Default::default();
        let model = tiny_config().init::<TestBackend>(&device);
        let enc = ints(&[4, 5, 6], [1, 3]);
        let dec = [2, 7, 8];

        let full = model.forward(enc.clone(), ints(&dec, [1, 3]));
        let full = full.into_data().to_vec::<f32>().unwrap();

        let encoded = model.encode(enc);
        let mut states = encoded.states.clone();
        let mut stepped = Vec::new();
        for &tok in &dec {
            let token = Tensor::<TestBackend, 1, Int>::from_ints([tok], &device);
            let (logits, next) = model.decode_step(token, states, encoded.outputs.clone());
            stepped.extend(logits.into_data().to_vec::<f32>().unwrap());
            states = next;
        }

        assert_eq!(full.len(), stepped.len());
        for (a, b) in full.iter().zip(&stepped) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_loss_ignores_masked_steps_and_is_non_negative() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 3>::random(
            [2, 3, 5],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        let targets = ints(&[1, 2, 0, 3, 0, 0], [2, 3]);
        let masks = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 1.0, 0.0, 1.0, 0.0, 0.0], [2, 3]),
            &device,
        );
        let loss: f32 = masked_sequence_loss(logits.clone(), targets.clone(), masks.clone()).into_scalar();
        assert!(loss >= 0.0);

        // Changing logits at masked-out steps leaves the loss unchanged
        let mut values = logits.into_data().to_vec::<f32>().unwrap();
        for v in &mut values[10..15] {
            *v += 5.0; // example 0, step 2
        }
        let changed = Tensor::<TestBackend, 3>::from_data(TensorData::new(values, [2, 3, 5]), &device);
        let loss2: f32 = masked_sequence_loss(changed, targets, masks).into_scalar();
        assert!((loss - loss2).abs() < 1e-5);
    }

    #[test]
    fn test_all_masked_batch_has_zero_loss() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 3>::ones([1, 2, 4], &device);
        let masks = Tensor::<TestBackend, 2>::zeros([1, 2], &device);
        let loss: f32 = masked_sequence_loss(logits, ints(&[1, 2], [1, 2]), masks).into_scalar();
        assert_eq!(loss, 0.0);
    }

    #[test]
    fn test_one_sgd_step_lowers_loss_on_repeated_batch() {
        type Train = Autodiff<NdArray>;
        let device = Default::default();
        let mut model = tiny_config().init::<Train>(&device);
        let mut optim = SgdConfig::new().init();

        let enc = Tensor::<Train, 1, Int>::from_ints([4, 5, 6], &device).reshape([1, 3]);
        let dec = Tensor::<Train, 1, Int>::from_ints([2, 7, 3], &device).reshape([1, 3]);
        let tgt = Tensor::<Train, 1, Int>::from_ints([7, 3, 0], &device).reshape([1, 3]);
        let mask = Tensor::<Train, 2>::from_data(TensorData::new(vec![1.0f32, 1.0, 0.0], [1, 3]), &device);

        let loss = masked_sequence_loss(model.forward(enc.clone(), dec.clone()), tgt.clone(), mask.clone());
        let before: f32 = loss.clone().into_scalar();
        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optim.step(0.1, model, grads);

        let after: f32 = masked_sequence_loss(model.valid().forward(
            enc.inner(), dec.inner()), tgt.inner(), mask.inner()).into_scalar();
        assert!(after < before);
    }
}
