use gemma_chat::config::OllamaConfig;
use gemma_chat::payload::{
    AudioPolicy, EndpointCapabilities, EndpointKind, PayloadBuilder, SystemPrompt,
};
use gemma_chat::providers::OllamaClient;
use gemma_chat::ChatSession;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn session_for(host: &str, endpoint: EndpointKind, audio_policy: AudioPolicy) -> ChatSession {
    let config = OllamaConfig {
        host: host.to_string(),
        model: "gemma3:4b".to_string(),
        endpoint,
        audio_policy,
    };
    let client = OllamaClient::new(&config).expect("failed to create client");
    let builder = PayloadBuilder::new(
        config.model.clone(),
        EndpointCapabilities::for_endpoint(endpoint, audio_policy),
    );
    ChatSession::new(client, builder, SystemPrompt::default())
}

#[allow(dead_code)]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("failed to encode png");
    buf.into_inner()
}
