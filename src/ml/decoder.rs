// ============================================================
// Layer 5 — Greedy Decoder
// ============================================================
// Turns a sentence into a translation with a trained Seq2Seq.
//
//   raw text
//     → Preprocessor::tokenize        ["hello", ",", "world"]
//     → encoder Vocabulary::ids       [57, 5, 212]
//     → smallest bucket that fits     (19, 19)
//     → single_batch                  padded + reversed encoder row
//     → encode, then decode_step × decoder_size
//         first input is <s>, every later input is the
//         previous argmax
//     → construct_response            cut at the first </s>
//     → decoder Vocabulary::sentence  "xin chào , thế giới"
//
// This is argmax decoding only, no beam search.

use anyhow::{anyhow, Result};
use burn::prelude::*;

use crate::data::{preprocessor::Preprocessor, seq_batcher::{single_batch, SeqBatcher}};
use crate::domain::{
    bucket::{find_encoder_bucket, max_encoder_size, Bucket},
    traits::Translator,
    vocab::{EOS_ID, START_ID},
};
use crate::infra::vocab_store::Vocabulary;
use crate::ml::seq2seq::Seq2Seq;

/// Keep the ids before the first </s>
pub fn construct_response(output_ids: &[u32]) -> &[u32] {
    match output_ids.iter().position(|&id| id == EOS_ID) {
        Some(end) => &output_ids[..end],
        None => output_ids,
    }
}

/// Run `steps` greedy decoding steps for one padded encoder row.
/// Returns the argmax id of every step, </s> included.
pub fn greedy_decode<B: Backend>(
    model: &Seq2Seq<B>,
    encoder_inputs: Tensor<B, 2, Int>,
    steps: usize,
    device: &B::Device,
) -> Result<Vec<u32>> {
    let encoded = model.encode(encoder_inputs);
    let mut states = encoded.states;
    let mut token = Tensor::<B, 1, Int>::from_ints([START_ID as i32], device);
    let mut output = Vec::with_capacity(steps);

    for _ in 0..steps {
        let (logits, next_states) = model.decode_step(token, states, encoded.outputs.clone());
        states = next_states;
        token = logits.argmax(1).flatten::<1>(0, 1);

        let id = token
            .clone()
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .map_err(|e| anyhow!("Cannot read decoder output: {e:?}"))?
            .first()
            .copied()
            .ok_or_else(|| anyhow!("Decoder produced no output"))?;
        output.push(id as u32);
    }
    Ok(output)
}

// ─── GreedyTranslator ─────────────────────────────────────────────────────────
pub struct GreedyTranslator<B: Backend> {
    model: Seq2Seq<B>,
    buckets: Vec<Bucket>,
    preprocessor: Preprocessor,
    encoder_vocab: Vocabulary,
    decoder_vocab: Vocabulary,
    device: B::Device,
}

impl<B: Backend> GreedyTranslator<B> {
    pub fn new(
        model: Seq2Seq<B>,
        buckets: Vec<Bucket>,
        encoder_vocab: Vocabulary,
        decoder_vocab: Vocabulary,
        device: B::Device,
    ) -> Self {
        Self {
            model,
            buckets,
            preprocessor: Preprocessor::new(),
            encoder_vocab,
            decoder_vocab,
            device,
        }
    }

    pub fn encoder_vocab(&self) -> &Vocabulary {
        &self.encoder_vocab
    }

    pub fn decoder_vocab(&self) -> &Vocabulary {
        &self.decoder_vocab
    }

    /// Largest sentence length (in tokens) any bucket accepts
    pub fn max_length(&self) -> usize {
        max_encoder_size(&self.buckets)
    }

    /// Decode already-encoded source ids. The result stops before </s>.
    pub fn translate_ids(&self, source: &[u32]) -> Result<Vec<u32>> {
        let index = find_encoder_bucket(&self.buckets, source.len()).ok_or_else(|| {
            anyhow!("The maximum sentence length is {} words", self.max_length())
        })?;
        let bucket = self.buckets[index];

        let batch = single_batch(source, bucket)?;
        let tensors = SeqBatcher::<B>::new(self.device.clone()).to_tensors(&batch);
        let output = greedy_decode(&self.model, tensors.encoder_inputs, bucket.decoder_size, &self.device)?;

        Ok(construct_response(&output).to_vec())
    }
}

impl<B: Backend> Translator for GreedyTranslator<B> {
    fn translate(&self, sentence: &str) -> Result<String> {
        let tokens = self.preprocessor.tokenize(sentence);
        let ids = self.encoder_vocab.ids(&tokens)?;
        let output = self.translate_ids(&ids)?;
        Ok(self.decoder_vocab.sentence(&output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bucket::default_buckets;
    use crate::infra::vocab_store::VocabStore;
    use crate::domain::vocab::Side;
    use crate::ml::seq2seq::Seq2SeqConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_construct_response_cuts_at_eos() {
        assert_eq!(construct_response(&[7, 8, 3, 9, 3]), &[7, 8]);
        assert_eq!(construct_response(&[3, 7]), &[] as &[u32]);
        assert_eq!(construct_response(&[7, 8]), &[7, 8]);
    }

    #[test]
    fn test_greedy_decode_runs_every_step() {
        let device = Default::default();
        let model = Seq2SeqConfig::new(10, 6)
            .with_hidden_size(4)
            .with_num_layers(1)
            .init::<TestBackend>(&device);
        let enc = Tensor::<TestBackend, 1, Int>::from_ints([0, 5, 4], &device).reshape([1, 3]);
        let out = greedy_decode(&model, enc, 5, &device).unwrap();
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|&id| id < 6));
    }

    fn translator(dir: &std::path::Path) -> GreedyTranslator<TestBackend> {
        let store = VocabStore::new(dir);
        let enc = store
            .build(Side::Encoder, &[vec!["hello".to_string(), "world".to_string()]], 1)
            .unwrap();
        let dec = store
            .build(Side::Decoder, &[vec!["xin".to_string(), "chào".to_string()]], 1)
            .unwrap();
        let device = Default::default();
        let model = Seq2SeqConfig::new(enc.len(), dec.len())
            .with_hidden_size(4)
            .with_num_layers(1)
            .init::<TestBackend>(&device);
        GreedyTranslator::new(model, vec![Bucket::new(3, 4), Bucket::new(5, 6)], enc, dec, device)
    }

    #[test]
    fn test_too_long_sentence_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let t = translator(dir.path());
        let err = t.translate("hello world hello world hello world").unwrap_err();
        assert_eq!(err.to_string(), "The maximum sentence length is 5 words");
    }

    #[test]
    fn test_translation_is_bounded_by_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let t = translator(dir.path());
        let ids = t.translate_ids(&[4, 5]).unwrap();
        assert!(ids.len() <= 4);
        assert!(!ids.contains(&EOS_ID));
        // Output words always come from the decoder vocabulary
        let sentence = t.translate("hello world").unwrap();
        for word in sentence.split_whitespace() {
            assert!(t.decoder_vocab().ids(&[word.to_string()]).is_ok());
        }
    }

    #[test]
    fn test_default_buckets_limit() {
        assert_eq!(max_encoder_size(&default_buckets()), 60);
    }
}
