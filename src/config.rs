use std::env;
use std::time::Duration;

pub struct Config {
    pub groq_api_key: String,
    pub groq_model: String,
    pub openai_model: String,
    pub prompts_file: String,
    pub behavior_file: String,
    pub bind_addr: String,
    pub polite_call_limit: usize,
    pub init_retries: usize,
    pub provider_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        // An absent key is not an error here: initialization falls back to
        // the secondary provider when the primary cannot be constructed.
        let groq_api_key = env::var("GROQ_API_KEY").unwrap_or_default();

        // Pass-through for the model-hosting integration; unused by the core.
        let hf_token = env::var("HF_TOKEN").unwrap_or_default();
        env::set_var("HF_TOKEN", hf_token);

        let groq_model =
            env::var("GROQ_MODEL").unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string());
        let openai_model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());

        let prompts_file = env::var("PROMPTS_FILE").unwrap_or_else(|_| "prompts.csv".to_string());
        let behavior_file =
            env::var("BEHAVIOR_FILE").unwrap_or_else(|_| "Behavior.csv".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:5000".to_string());

        let polite_call_limit = parse_or("POLITE_CALL_LIMIT", 5);
        let init_retries = parse_or("INIT_RETRIES", 3);
        let provider_timeout = Duration::from_secs(parse_or("PROVIDER_TIMEOUT_SECS", 60) as u64);

        Self {
            groq_api_key,
            groq_model,
            openai_model,
            prompts_file,
            behavior_file,
            bind_addr,
            polite_call_limit,
            init_retries,
            provider_timeout,
        }
    }
}

fn parse_or(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
