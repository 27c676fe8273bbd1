// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Compile-time defaults used when neither the stack manifest nor a context
//! override supplies a value.

use std::time::Duration;

pub const AGENT_NAME: &str = "travel-agent";

/// Placeholder API key. Strict resolution refuses to deploy with it.
pub const API_KEY: &str = "<API_KEY>";

pub const AGENT_MODEL: &str = "anthropic.claude-3-haiku-20240307-v1:0";

pub const AGENT_INSTRUCTION: &str = r#"
You are a personal travel AI assistant that helps users search for flights, hotels, and plan vacations while also considering their financial portfolio.

For complex queries that involve both travel and finance, follow these steps in order:

1. Travel Cost Calculation:
   - Search for flights with specified parameters (dates, locations, number of passengers)
   - Search for hotels if accommodation is needed
   - Calculate total travel cost including all travelers
   - Consider shared accommodations when appropriate
   - Present a breakdown of all costs

2. Portfolio Analysis:
   - Check the current portfolio value and stock prices
   - Compare total travel costs with available funds
   - If selling stocks is needed:
     a) Calculate exactly how many shares need to be sold
     b) Suggest the best selling strategy (proportional or single stock)
     c) Show remaining portfolio value after the sale

3. Final Recommendation:
   - Clearly state if the trip is financially feasible
   - Present the complete travel plan with costs
   - If stocks need to be sold, provide detailed selling instructions
   - Suggest alternatives if the original plan is not feasible

Always ask clarifying questions if you need more information about:
- Travel dates
- Number of travelers
- Accommodation preferences
- Stock selling preferences
- Any other details needed for accurate calculations

Make sure to handle errors gracefully and explain any limitations or assumptions in your calculations.
Present all monetary values in USD and round to 2 decimal places."#;

pub const AGENT_DESCRIPTION: &str = r#"
This AI assistant helps plan your travels while considering your financial portfolio. It can search for flights and hotels, calculate total travel costs, and determine if your stock portfolio can cover the expenses. It also provides detailed recommendations on which stocks to sell if needed.
"#;

/// Environment variable carrying the portfolio unit's domain data.
pub const STOCK_PORTFOLIO_VAR: &str = "STOCK_PORTFOLIO";

/// Fallback when `STOCK_PORTFOLIO` is not set.
pub const STOCK_PORTFOLIO_DEFAULT: &str = "{}";

/// Environment variable the API key is injected under.
pub const API_KEY_VAR: &str = "API_KEY";

pub const COMPUTE_TIMEOUT: Duration = Duration::from_secs(300);

pub const LOG_RETENTION_DAYS: u16 = 30;

pub const TRAVEL_UNIT: &str = "travel";
pub const TRAVEL_PACKAGE_DIR: &str = "lib/assets/lambda/travel";
pub const TRAVEL_CAPABILITY: &str = "travel-api";
pub const TRAVEL_SCHEMA_KEY: &str = "api-schema/travel_schema.json";
pub const TRAVEL_CAPABILITY_DESCRIPTION: &str = "API to obtain flights and hotels from SerpAPI.";

pub const PORTFOLIO_UNIT: &str = "portfolio";
pub const PORTFOLIO_PACKAGE_DIR: &str = "lib/assets/lambda/portfolio";
pub const PORTFOLIO_CAPABILITY: &str = "portfolio-api";
pub const PORTFOLIO_SCHEMA_KEY: &str = "api-schema/portfolio_schema.json";
pub const PORTFOLIO_CAPABILITY_DESCRIPTION: &str =
    "API to check stock portfolio value and compare with travel costs.";
