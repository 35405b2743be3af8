//! REST client integration tests against a wiremock server

use sarpilot::models::{Direction, SignalType};
use sarpilot::services::{
    AiSignalProvider, ExecutionGateway, MarketDataProvider, RestClient,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client(server: &MockServer) -> RestClient {
    RestClient::new(server.uri()).unwrap()
}

#[tokio::test]
async fn test_get_candles_parses_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/candles"))
        .and(query_param("symbol", "ETH-USDT-SWAP"))
        .and(query_param("bar", "15m"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                { "time": 1709251200000i64, "open": 100.0, "high": 101.0, "low": 99.0, "close": 100.5, "volume": 12.0 },
                { "time": 1709252100000i64, "open": 100.5, "high": 102.0, "low": 100.0, "close": 101.5 }
            ],
            "error": null
        })))
        .mount(&server)
        .await;

    let candles = client(&server)
        .await
        .get_candles("ETH-USDT-SWAP", "15m", 100)
        .await
        .unwrap();
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].close, 100.5);
    // Missing volume defaults to zero.
    assert_eq!(candles[1].volume, 0.0);
    assert!(candles[0].timestamp < candles[1].timestamp);
}

#[tokio::test]
async fn test_get_latest_analysis() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ai/analysis/latest"))
        .and(query_param("symbol", "ETH-USDT-SWAP"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "inst_id": "ETH-USDT-SWAP",
                "signal_type": "buy",
                "confidence": 0.82,
                "suggested_price": 3050.5,
                "stop_loss": null,
                "take_profit": null,
                "timestamp": 1709251200000i64
            },
            "error": null
        })))
        .mount(&server)
        .await;

    let analysis = client(&server)
        .await
        .get_latest_analysis("ETH-USDT-SWAP")
        .await
        .unwrap();
    assert_eq!(analysis.symbol, "ETH-USDT-SWAP");
    assert_eq!(analysis.signal_type, SignalType::Buy);
    assert!((analysis.confidence - 0.82).abs() < 1e-12);
    assert_eq!(analysis.suggested_price, Some(3050.5));
    assert!(analysis.stop_loss.is_none());
}

#[tokio::test]
async fn test_envelope_failure_surfaces_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ai/analysis/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "data": null,
            "error": "no analysis available"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .get_latest_analysis("ETH-USDT-SWAP")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no analysis available"));
}

#[tokio::test]
async fn test_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/positions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server).await.get_positions().await.unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_get_positions_camel_case_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/positions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{
                "id": "pos-1",
                "symbol": "ETH-USDT-SWAP",
                "side": "long",
                "size": 0.5,
                "entryPrice": 3000.0,
                "unrealizedPnl": 15.0,
                "entryTime": 1709251200000i64
            }],
            "error": null
        })))
        .mount(&server)
        .await;

    let positions = client(&server).await.get_positions().await.unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].side, Direction::Long);
    assert_eq!(positions[0].entry_price, 3000.0);
    // Leverage absent from the payload falls back to 1.
    assert_eq!(positions[0].leverage, 1);
}

#[tokio::test]
async fn test_balance_decimal_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/balance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "total_equity": "1234.56" },
            "error": null
        })))
        .mount(&server)
        .await;

    let balance = client(&server).await.get_account_balance().await.unwrap();
    assert!((balance.total_equity - 1234.56).abs() < 1e-9);
}

#[tokio::test]
async fn test_balance_bare_number() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/balance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "total_equity": 987.5 },
            "error": null
        })))
        .mount(&server)
        .await;

    let balance = client(&server).await.get_account_balance().await.unwrap();
    assert!((balance.total_equity - 987.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_execute_trade_sends_expected_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/trade"))
        .and(body_json(json!({
            "symbol": "ETH-USDT-SWAP",
            "side": "long",
            "size": 400.0,
            "leverage": 3
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "order_id": "ord-42", "filled_price": 3001.5 },
            "error": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let order = client(&server)
        .await
        .execute_trade("ETH-USDT-SWAP", Direction::Long, 400.0, 3)
        .await
        .unwrap();
    assert_eq!(order.order_id, "ord-42");
    assert_eq!(order.filled_price, Some(3001.5));
}

#[tokio::test]
async fn test_close_position_body_and_fallback_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/positions/close"))
        .and(body_json(json!({ "positionId": "pos-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "realized_pnl": -3.2 },
            "error": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server).await.close_position("pos-1").await.unwrap();
    // Response omitted the id; the client echoes the request id back.
    assert_eq!(result.position_id, "pos-1");
    assert_eq!(result.realized_pnl, Some(-3.2));
}
