use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

use pilot_engine::agent::{ConversationHistory, Step, StepExecutor};
use pilot_engine::config::Config;
use pilot_engine::llm::{extract_json_array, extract_json_object, Message};
use pilot_engine::tools::calculator::evaluate;
use pilot_engine::tools::ToolRegistry;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (-1000i64..1000, -1000i64..1000).prop_map(|(a, b)| {
            let mut params = Map::new();
            params.insert("expression".to_string(), json!(format!("{} + {}", a, b)));
            Step::new("calculate", params)
        }),
        "[a-z ]{1,12}".prop_map(|q| {
            let mut params = Map::new();
            params.insert("query".to_string(), json!(q));
            Step::new("search_web", params)
        }),
        "[a-z_]{1,10}".prop_map(|name| Step::new(format!("x_{}", name), Map::new())),
        Just(Step::new("get_weather", Map::new())),
    ]
}

// Configuration round-trip: every valid config survives save/load unchanged
proptest! {
    #[test]
    fn test_config_parsing_round_trip(
        log_level in "error|warn|info|debug|trace",
        model in "[a-z0-9.-]{1,20}",
        temperature in 0.0..=2.0f64,
        synthesis_window in 1..=50usize,
        history_limit in proptest::option::of(2..=500usize),
        max_concurrent_tools in 1..=16usize,
        parse_retries in 0..=5u32,
    ) {
        let mut config = Config::default();
        config.core.log_level = log_level;
        config.llm.model = model;
        config.llm.temperature = temperature;
        config.agent.synthesis_window = synthesis_window;
        config.agent.history_limit = history_limit;
        config.agent.max_concurrent_tools = max_concurrent_tools;
        config.agent.parse_retries = parse_retries;
        prop_assert!(config.validate().is_ok());

        let serialized = toml::to_string(&config).unwrap();
        let parsed = Config::from_toml(&serialized).unwrap();

        prop_assert_eq!(&parsed.core.log_level, &config.core.log_level);
        prop_assert_eq!(&parsed.llm.model, &config.llm.model);
        prop_assert_eq!(parsed.llm.temperature, config.llm.temperature);
        prop_assert_eq!(parsed.agent.synthesis_window, config.agent.synthesis_window);
        prop_assert_eq!(parsed.agent.history_limit, config.agent.history_limit);
        prop_assert_eq!(parsed.agent.max_concurrent_tools, config.agent.max_concurrent_tools);
        prop_assert_eq!(parsed.agent.parse_retries, config.agent.parse_retries);
    }
}

// Executor: one outcome per step, in step order, exactly one of result/error
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_executor_preserves_length_and_order(
        steps in proptest::collection::vec(arb_step(), 0..12),
        max_concurrent in 1..=4usize,
    ) {
        let executor = StepExecutor::new(
            Arc::new(ToolRegistry::with_builtins()),
            max_concurrent,
            Duration::from_secs(5),
        );
        let batch = runtime().block_on(executor.execute(steps.clone()));

        prop_assert_eq!(batch.len(), steps.len());
        for (outcome, step) in batch.outcomes().iter().zip(&steps) {
            prop_assert_eq!(outcome.step(), step);
            prop_assert!(outcome.result().is_some() != outcome.error().is_some());
            if step.tool.starts_with("x_") {
                let expected = format!("Tool '{}' not found", step.tool);
                prop_assert_eq!(outcome.error(), Some(expected.as_str()));
            }
        }
    }
}

// Calculator: integer addition and multiplication agree with Rust arithmetic
proptest! {
    #[test]
    fn test_calculator_matches_integer_arithmetic(
        a in -10_000i64..10_000,
        b in -10_000i64..10_000,
        c in 1i64..100,
    ) {
        let expr = format!("({}) + ({}) * {}", a, b, c);
        prop_assert_eq!(evaluate(&expr).unwrap(), (a + b * c) as f64);
    }

    #[test]
    fn test_calculator_rejects_identifiers(name in "[a-zA-Z_][a-zA-Z0-9_]{0,10}") {
        prop_assert!(evaluate(&name).is_err());
        let expr = format!("1 + {}", name);
        prop_assert!(evaluate(&expr).is_err());
    }
}

// History: a bounded history never exceeds its capacity and keeps the newest
proptest! {
    #[test]
    fn test_history_bound(capacity in 2..20usize, pushes in 0..60usize) {
        let mut history = ConversationHistory::with_capacity_limit(capacity);
        for i in 0..pushes {
            history.push(Message::user(format!("m{}", i)));
        }

        prop_assert_eq!(history.len(), pushes.min(capacity));
        if pushes > 0 {
            let last = history.messages().pop().unwrap();
            prop_assert_eq!(last.content, format!("m{}", pushes - 1));
        }
    }
}

// JSON extraction: a valid object survives fencing and surrounding prose
proptest! {
    #[test]
    fn test_extract_from_fenced_prose(
        query in "[a-zA-Z0-9 ,.?!]{0,30}",
        prefix in "[a-zA-Z ,.:]{0,30}",
        suffix in "[a-zA-Z ,.]{0,30}",
    ) {
        let object = json!({"task_type": "search", "query": query}).to_string();
        let fenced = format!("{}\n```json\n{}\n```\n{}", prefix, object, suffix);

        let extracted = extract_json_object(&fenced).unwrap();
        let value: Value = serde_json::from_str(extracted).unwrap();
        prop_assert_eq!(value["query"].as_str(), Some(query.as_str()));

        let inline = format!("{} {} {}", prefix, object, suffix);
        prop_assert_eq!(extract_json_object(&inline), Some(object.as_str()));
    }

    #[test]
    fn test_extract_array_from_prose(n in 0..5usize, prefix in "[a-zA-Z ,.:]{0,30}") {
        let steps: Vec<Value> = (0..n)
            .map(|i| json!({"tool": "calculate", "parameters": {"expression": format!("{}+1", i)}}))
            .collect();
        let array = Value::Array(steps).to_string();
        let text = format!("{}{}", prefix, array);

        prop_assert_eq!(extract_json_array(&text), Some(array.as_str()));
    }
}
