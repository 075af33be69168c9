// ============================================================
// Layer 3 — Vocabulary Conventions
// ============================================================
// The translator reserves the first four ids of every
// vocabulary. Both the encoder (English) and decoder
// (Vietnamese) vocabularies share this layout:
//
//   0  <pad>   padding up to the bucket length
//   1  <unk>   any word not in the vocabulary
//   2  <s>     start of a decoder sentence
//   3  </s>    end of a decoder sentence
//
// Everything from id 4 onwards is a real word.

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;
pub const START_ID: u32 = 2;
pub const EOS_ID: u32 = 3;

pub const PAD_TOKEN: &str = "<pad>";
pub const UNK_TOKEN: &str = "<unk>";
pub const START_TOKEN: &str = "<s>";
pub const EOS_TOKEN: &str = "</s>";

/// Reserved tokens in id order
pub const SPECIAL_TOKENS: [&str; 4] = [PAD_TOKEN, UNK_TOKEN, START_TOKEN, EOS_TOKEN];

/// Which side of a sentence pair a vocabulary belongs to.
/// The side also names the files on disk (`vocab.enc`, `train_ids.dec`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Encoder,
    Decoder,
}

impl Side {
    pub fn extension(&self) -> &'static str {
        match self {
            Side::Encoder => "enc",
            Side::Decoder => "dec",
        }
    }
}

/// Strip the `<s>` prefix and cut at the first `</s>`.
/// Used to recover the reference sentence from a decoder id line.
pub fn strip_decoder_markers(ids: &[u32]) -> &[u32] {
    let body = match ids.first() {
        Some(&START_ID) => &ids[1..],
        _ => ids,
    };
    match body.iter().position(|&id| id == EOS_ID) {
        Some(end) => &body[..end],
        None => body,
    }
}
