use tantivy::schema::{IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

pub const PASSAGE_TOKENIZER: &str = "passage_text";

/// One tantivy document per passage. Only `text` is tokenized.
pub fn build_passage_schema() -> Schema {
    let mut builder = Schema::builder();
    builder.add_text_field("chunk_id", STRING | STORED);
    builder.add_text_field("document_id", STRING | STORED);
    builder.add_text_field("content_hash", STRING | STORED);
    builder.add_u64_field("ordinal", STORED);
    let indexing = TextFieldIndexing::default()
        .set_tokenizer(PASSAGE_TOKENIZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    builder.add_text_field("text", TextOptions::default().set_indexing_options(indexing).set_stored());
    builder.build()
}

/// Tokenizers are not persisted with the index; call this on every open.
pub fn register_tokenizer(index: &Index) {
    let stop_words = [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "in", "is", "it", "its", "of", "on",
        "that", "the", "to", "was", "will", "with", "or", "but", "not", "this", "these", "they", "there", "then",
    ];
    let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(StopWordFilter::remove(stop_words.iter().map(|s| s.to_string())))
        .build();
    index.tokenizers().register(PASSAGE_TOKENIZER, analyzer);
}
