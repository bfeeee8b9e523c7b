//! End-to-end: corpus -> build -> load -> retrieve -> advise.

use super::support::{FixedEmbedder, RecordingLlm};
use crate::advice::{AdviceGenerator, AdviceMode, AdviceOptions};
use crate::builder::{build_from_corpus, build_index};
use crate::corpus::read_corpus;
use crate::retriever::{RetrievalContext, Retriever};
use mytherapy_core::AppConfig;
use mytherapy_prompt::PromptSet;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_round_trip_nearest_document_first() {
    let temp = TempDir::new().unwrap();
    let index_path = temp.path().join("index.bin");
    let metadata_path = temp.path().join("metadata.json");
    let corpus = read_corpus("Context\na\nb\nc\n".as_bytes(), "Context").unwrap();
    let embedder = Arc::new(
        FixedEmbedder::new(2)
            .with("a", &[0.0, 0.0])
            .with("b", &[1.0, 0.0])
            .with("c", &[2.0, 0.0])
            .with("close to b", &[1.1, 0.0]),
    );

    build_from_corpus(&corpus, embedder.as_ref(), &index_path, &metadata_path)
        .await
        .unwrap();
    let context = RetrievalContext::from_paths(&index_path, &metadata_path, embedder).unwrap();
    let retriever = Retriever::from_context(context);

    assert_eq!(retriever.retrieve("close to b", 1).await.unwrap(), vec!["b"]);
    assert_eq!(
        retriever.retrieve("close to b", 3).await.unwrap(),
        vec!["b", "c", "a"]
    );
}

#[tokio::test]
async fn test_retrieve_never_exceeds_k() {
    let temp = TempDir::new().unwrap();
    let index_path = temp.path().join("index.bin");
    let metadata_path = temp.path().join("metadata.json");
    let corpus = read_corpus("Context\na\nb\nc\n".as_bytes(), "Context").unwrap();
    let embedder = Arc::new(
        FixedEmbedder::new(1)
            .with("a", &[0.0])
            .with("b", &[1.0])
            .with("c", &[2.0])
            .with("q", &[0.4]),
    );

    build_from_corpus(&corpus, embedder.as_ref(), &index_path, &metadata_path)
        .await
        .unwrap();
    let retriever = Retriever::from_context(
        RetrievalContext::from_paths(&index_path, &metadata_path, embedder).unwrap(),
    );

    for k in 0..6 {
        let chunks = retriever.retrieve("q", k).await.unwrap();
        assert_eq!(chunks.len(), k.min(3));
    }
}

#[tokio::test]
async fn test_exam_anxiety_scenario() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("train.csv"),
        "Context,Response\n\
         I feel anxious about exams,Plan short study sessions\n\
         I feel happy today,Celebrate it\n\
         I am scared of failing,Talk through the worst case\n",
    )
    .unwrap();

    let mut config = AppConfig {
        workspace: temp.path().to_path_buf(),
        ..Default::default()
    };
    config.rag.corpus_path = "train.csv".into();

    build_index(&config).await.unwrap();

    let retriever = Retriever::load(&config).await;
    assert!(!retriever.is_degraded());

    let llm = Arc::new(RecordingLlm::replying("You are not alone."));
    let generator = AdviceGenerator::new(
        retriever,
        llm.clone(),
        PromptSet::builtin(),
        AdviceOptions::from_config(&config),
    );

    let outcome = generator.generate_advice("I'm scared of my exam").await;

    let advice = outcome.advice().unwrap();
    assert_eq!(advice.mode, AdviceMode::Rag);
    assert!(
        advice.chunks[0] == "I feel anxious about exams"
            || advice.chunks[0] == "I am scared of failing"
    );
    assert_ne!(advice.chunks[0], "I feel happy today");
    assert!(llm.requests()[0].prompt.contains(&advice.chunks[0]));
}
