//! Integration tests for the SOAP client against a mock device.

use mockito::{Matcher, Server, ServerGuard};
use soap_client::{ActionRequest, DeviceEndpoint, SoapClient, SoapError};
use std::io::Write;
use std::time::Duration;

const SKY_PLAY: &str = "urn:schemas-nds-com:service:SkyPlay:2";
const CALLBACK_URL: &str = concat!(
    "http://10.0.0.5:50123",
    "/uuid:444D5276-3253-6B79-436F-0019fb7d7534/urn:nds-com:serviceId:SkyPlay2"
);

fn endpoint_for(server: &ServerGuard) -> DeviceEndpoint {
    let address = server.host_with_port();
    let (host, port) = address.rsplit_once(':').unwrap();
    DeviceEndpoint::new(host, port.parse().unwrap())
}

fn media_info_reply(uri: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
<s:Body>
<u:GetMediaInfoResponse xmlns:u="urn:schemas-nds-com:service:SkyPlay:2">
<NrTracks>1</NrTracks>
<CurrentURI>{}</CurrentURI>
</u:GetMediaInfoResponse>
</s:Body>
</s:Envelope>"#,
        uri
    )
}

#[tokio::test]
async fn test_call_sends_protocol_headers_and_decodes_reply() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/SkyPlay2")
        .match_header("user-agent", "SKY_skyplus")
        .match_header("soapaction", "\"urn:schemas-nds-com:service:SkyPlay:2#GetMediaInfo\"")
        .match_header("content-type", "text/xml; charset=\"utf-8\"")
        .match_body(Matcher::Regex("<InstanceID>0</InstanceID>".to_string()))
        .with_status(200)
        .with_header("content-type", "text/xml; charset=\"utf-8\"")
        .with_body(media_info_reply("xsi://7D2"))
        .create_async()
        .await;

    let client = SoapClient::new();
    let request = ActionRequest::new("GetMediaInfo", SKY_PLAY).param("InstanceID", 0);

    let response = client
        .call(&endpoint_for(&server), "/SkyPlay2", &request)
        .await
        .expect("call should succeed");

    assert_eq!(response.field("CurrentURI"), Some("xsi://7D2"));
    assert_eq!(response.field("NrTracks"), Some("1"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_chunked_reply_is_decoded_once_complete() {
    let mut server = Server::new_async().await;
    let reply = media_info_reply("file://pvr/2B");
    let (first, second) = reply.split_at(reply.len() / 2);
    let (first, second) = (first.to_string(), second.to_string());

    server
        .mock("POST", "/SkyPlay2")
        .with_status(200)
        .with_chunked_body(move |w| {
            w.write_all(first.as_bytes())?;
            w.write_all(second.as_bytes())
        })
        .create_async()
        .await;

    let client = SoapClient::new();
    let request = ActionRequest::new("GetMediaInfo", SKY_PLAY).param("InstanceID", 0);

    let response = client
        .call(&endpoint_for(&server), "/SkyPlay2", &request)
        .await
        .expect("chunked reply should decode");

    assert_eq!(response.field("CurrentURI"), Some("file://pvr/2B"));
}

#[tokio::test]
async fn test_path_override_is_used() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/custom/SkyPlay")
        .with_status(200)
        .with_body(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:PlayResponse xmlns:u="urn:schemas-nds-com:service:SkyPlay:2"></u:PlayResponse></s:Body></s:Envelope>"#,
        )
        .create_async()
        .await;

    let endpoint = endpoint_for(&server).with_path_override("/custom/SkyPlay");
    let request = ActionRequest::new("Play", SKY_PLAY)
        .param("InstanceID", 0)
        .param("Speed", 1);

    let response = SoapClient::new()
        .call(&endpoint, "/SkyPlay2", &request)
        .await
        .unwrap();

    assert!(response.response_element().is_some());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fault_reply_is_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/SkyPlay2")
        .with_status(500)
        .with_body(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Client</faultcode><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>701</errorCode></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#,
        )
        .create_async()
        .await;

    let request = ActionRequest::new("Pause", SKY_PLAY).param("InstanceID", 0);
    let result = SoapClient::new()
        .call(&endpoint_for(&server), "/SkyPlay2", &request)
        .await;

    assert!(matches!(result, Err(SoapError::Fault(701))));
}

#[tokio::test]
async fn test_http_error_without_envelope_is_network_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/SkyPlay2")
        .with_status(404)
        .with_body("not here")
        .create_async()
        .await;

    let request = ActionRequest::new("Play", SKY_PLAY);
    let result = SoapClient::new()
        .call(&endpoint_for(&server), "/SkyPlay2", &request)
        .await;

    match result {
        Err(SoapError::Network(msg)) => assert!(msg.contains("404")),
        other => panic!("Expected SoapError::Network, got {:?}", other),
    }
}

#[tokio::test]
async fn test_stalled_device_times_out() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    // Accept connections and never answer
    let stall = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = SoapClient::with_timeout(Duration::from_millis(200));
    let request = ActionRequest::new("Play", SKY_PLAY);
    let result = client
        .call(&DeviceEndpoint::new("127.0.0.1", port), "/SkyPlay2", &request)
        .await;

    assert!(matches!(result, Err(SoapError::Timeout(_))), "got {:?}", result);
    stall.abort();
}

#[tokio::test]
async fn test_subscribe_returns_sid() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("SUBSCRIBE", "/SkyPlay2")
        .match_header("nt", "upnp:event")
        .match_header("callback", format!("<{}>", CALLBACK_URL).as_str())
        .with_status(200)
        .with_header("SID", "uuid:8a1c0de2-0000-1000-8000-0019fb7d7534")
        .create_async()
        .await;

    let response = SoapClient::new()
        .subscribe(&endpoint_for(&server), "/SkyPlay2", CALLBACK_URL)
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(
        response.sid.as_deref(),
        Some("uuid:8a1c0de2-0000-1000-8000-0019fb7d7534")
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_subscribe_without_sid_header() {
    let mut server = Server::new_async().await;
    server
        .mock("SUBSCRIBE", "/SkyPlay2")
        .with_status(412)
        .create_async()
        .await;

    let response = SoapClient::new()
        .subscribe(&endpoint_for(&server), "/SkyPlay2", "http://10.0.0.5:50123/")
        .await
        .unwrap();

    assert_eq!(response.status, 412);
    assert!(response.sid.is_none());
}

#[tokio::test]
async fn test_unsubscribe_sends_sid() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("UNSUBSCRIBE", "/SkyPlay2")
        .match_header("sid", "uuid:abc")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    SoapClient::new()
        .unsubscribe(&endpoint_for(&server), "/SkyPlay2", "uuid:abc")
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_event_requests_ignore_path_override() {
    let mut server = Server::new_async().await;
    let subscribe = server
        .mock("SUBSCRIBE", "/SkyPlay2")
        .match_header("sid", Matcher::Missing)
        .with_status(200)
        .with_header("SID", "uuid:override")
        .expect(1)
        .create_async()
        .await;
    let renew = server
        .mock("SUBSCRIBE", "/SkyPlay2")
        .match_header("sid", "uuid:override")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let unsubscribe = server
        .mock("UNSUBSCRIBE", "/SkyPlay2")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let overridden = server
        .mock("SUBSCRIBE", "/custom/SkyPlay")
        .expect(0)
        .create_async()
        .await;

    let endpoint = endpoint_for(&server).with_path_override("/custom/SkyPlay");
    let client = SoapClient::new();

    let response = client
        .subscribe(&endpoint, "/SkyPlay2", CALLBACK_URL)
        .await
        .unwrap();
    assert_eq!(response.sid.as_deref(), Some("uuid:override"));

    let renewed = client
        .renew_subscription(&endpoint, "/SkyPlay2", "uuid:override")
        .await
        .unwrap();
    assert_eq!(renewed.status, 200);

    client
        .unsubscribe(&endpoint, "/SkyPlay2", "uuid:override")
        .await
        .unwrap();

    subscribe.assert_async().await;
    renew.assert_async().await;
    unsubscribe.assert_async().await;
    overridden.assert_async().await;
}
