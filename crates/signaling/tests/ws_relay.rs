//! Integration-Tests fuer den WebSocket-Hub (echter Listener auf 127.0.0.1)

use futures_util::{SinkExt, StreamExt};
use rendezvous_observability::RendezvousMetrics;
use rendezvous_signaling::{SignalingConfig, SignalingServer, SignalingState};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WARTEZEIT: Duration = Duration::from_secs(5);

struct Hub {
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    state: Arc<SignalingState>,
}

async fn hub_starten(config: SignalingConfig) -> Hub {
    let metriken = RendezvousMetrics::neu().expect("Metriken");
    let state = SignalingState::neu(config, metriken);
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Listener binden");
    let addr = listener.local_addr().expect("lokale Adresse");
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let server = SignalingServer::neu(Arc::clone(&state), addr);
    tokio::spawn(server.mit_listener(listener, shutdown_rx));

    Hub {
        addr,
        shutdown_tx,
        state,
    }
}

async fn verbinden(addr: SocketAddr) -> Client {
    let url = format!("ws://{addr}/ws");
    let (stream, _response) = tokio_tungstenite::connect_async(url)
        .await
        .expect("WebSocket-Verbindung fehlgeschlagen");
    stream
}

async fn senden(client: &mut Client, event: &str, data: Value) {
    let frame = json!({"event": event, "data": data}).to_string();
    client
        .send(Message::Text(frame))
        .await
        .expect("Senden fehlgeschlagen");
}

/// Naechstes Event als `(name, data)`, Ping/Pong werden uebersprungen
async fn empfangen(client: &mut Client) -> (String, Value) {
    loop {
        let frame = tokio::time::timeout(WARTEZEIT, client.next())
            .await
            .expect("Timeout beim Warten auf ein Event")
            .expect("Stream beendet")
            .expect("Lesefehler");
        if let Message::Text(text) = frame {
            let mut umschlag: Value = serde_json::from_str(&text).expect("gueltiges JSON");
            let name = umschlag["event"].as_str().expect("Event-Name").to_string();
            return (name, umschlag["data"].take());
        }
    }
}

async fn registrieren(client: &mut Client, email: &str, name: &str) -> Value {
    senden(
        client,
        "register:user",
        json!({"email": email, "name": name, "avatar": format!("{name}.png")}),
    )
    .await;
    let (event, data) = empfangen(client).await;
    assert_eq!(event, "list:users");
    data
}

#[tokio::test]
async fn zwei_parteien_anruf_ueber_raum() {
    let hub = hub_starten(SignalingConfig::default()).await;
    let mut a = verbinden(hub.addr).await;
    let mut b = verbinden(hub.addr).await;

    assert_eq!(registrieren(&mut a, "a@x.de", "A").await, json!([]));
    let liste = registrieren(&mut b, "b@x.de", "B").await;
    assert_eq!(
        liste,
        json!([{"email": "a@x.de", "name": "A", "avatar": "A.png"}])
    );
    assert_eq!(
        empfangen(&mut a).await,
        (
            "user:connected".to_string(),
            json!({"email": "b@x.de", "name": "B", "avatar": "B.png"})
        )
    );

    senden(&mut a, "room:join", json!({"email": "a@x.de", "room": "r1"})).await;
    assert_eq!(
        empfangen(&mut a).await,
        ("room:join".to_string(), json!({"email": "a@x.de", "room": "r1"}))
    );

    senden(&mut b, "room:join", json!({"email": "b@x.de", "room": "r1"})).await;
    let (event, beigetreten) = empfangen(&mut a).await;
    assert_eq!(event, "user:joined");
    assert_eq!(beigetreten["email"], "b@x.de");
    let b_id = beigetreten["id"].clone();
    assert!(b_id.is_string());
    assert_eq!(empfangen(&mut b).await.0, "room:join");

    senden(&mut a, "user:call", json!({"to": b_id, "offer": {"sdp": "o"}})).await;
    let (event, anruf) = empfangen(&mut b).await;
    assert_eq!(event, "incomming:call");
    assert_eq!(anruf["offer"], json!({"sdp": "o"}));
    let a_id = anruf["from"].clone();

    senden(&mut b, "call:accepted", json!({"to": a_id, "ans": {"sdp": "a"}})).await;
    assert_eq!(
        empfangen(&mut a).await,
        ("call:accepted".to_string(), json!({"from": b_id, "ans": {"sdp": "a"}}))
    );

    senden(&mut b, "peer:nego:done", json!({"to": a_id, "ans": "n"})).await;
    assert_eq!(
        empfangen(&mut a).await,
        ("peer:nego:final".to_string(), json!({"from": b_id, "ans": "n"}))
    );

    b.close(None).await.expect("Schliessen");
    assert_eq!(
        empfangen(&mut a).await,
        ("user:disconnected".to_string(), json!("b@x.de"))
    );
}

#[tokio::test]
async fn chat_erreicht_ziel_identitaet() {
    let hub = hub_starten(SignalingConfig::default()).await;
    let mut a = verbinden(hub.addr).await;
    let mut b = verbinden(hub.addr).await;

    registrieren(&mut b, "b@x.de", "B").await;
    registrieren(&mut a, "a@x.de", "A").await;
    assert_eq!(empfangen(&mut b).await.0, "user:connected");

    // Unbekanntes Ziel wird still verworfen, danach kommt die echte Nachricht
    senden(&mut a, "chat-message", json!({"email": "x@x.de", "msg": "weg"})).await;
    senden(&mut a, "chat-message", json!({"email": "b@x.de", "msg": {"text": "hi"}})).await;
    assert_eq!(
        empfangen(&mut b).await,
        ("chat-message".to_string(), json!({"text": "hi"}))
    );
}

#[tokio::test]
async fn ungueltige_frames_werden_ignoriert() {
    let hub = hub_starten(SignalingConfig::default()).await;
    let mut a = verbinden(hub.addr).await;

    a.send(Message::Text("kein json".into())).await.expect("Senden");
    senden(&mut a, "unbekannt:event", json!({})).await;
    a.send(Message::Binary(vec![1, 2, 3])).await.expect("Senden");

    assert_eq!(registrieren(&mut a, "a@x.de", "A").await, json!([]));
    assert_eq!(hub.state.metriken.frames_rejected_total.get(), 3);
}

#[tokio::test]
async fn volles_limit_lehnt_upgrade_ab() {
    let config = SignalingConfig {
        max_verbindungen: 1,
        ..SignalingConfig::default()
    };
    let hub = hub_starten(config).await;
    let mut a = verbinden(hub.addr).await;
    // Rundreise stellt sicher, dass die Verbindung registriert ist
    registrieren(&mut a, "a@x.de", "A").await;

    let url = format!("ws://{}/ws", hub.addr);
    match tokio_tungstenite::connect_async(url).await {
        Err(tungstenite::Error::Http(antwort)) => {
            assert_eq!(antwort.status().as_u16(), 503);
        }
        Err(e) => panic!("Unerwarteter Fehler: {e}"),
        Ok(_) => panic!("Upgrade haette abgelehnt werden muessen"),
    }

    // Nach dem Schliessen wird der Slot wieder frei
    a.close(None).await.expect("Schliessen");
    let url = format!("ws://{}/ws", hub.addr);
    let wieder_verbunden = tokio::time::timeout(WARTEZEIT, async {
        loop {
            if let Ok((client, _)) = tokio_tungstenite::connect_async(url.as_str()).await {
                break client;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    let mut c = wieder_verbunden.expect("Slot wurde nicht freigegeben");
    assert_eq!(registrieren(&mut c, "c@x.de", "C").await, json!([]));
    assert_eq!(hub.state.freie_slots(), 0);
}

#[tokio::test]
async fn zu_grosser_frame_haelt_verbindung_offen() {
    let config = SignalingConfig {
        max_frame_groesse: 256,
        ..SignalingConfig::default()
    };
    let hub = hub_starten(config).await;
    let mut a = verbinden(hub.addr).await;

    // Ueber dem Frame-Limit, aber unter der Transport-Grenze
    let fuellung = "x".repeat(600);
    senden(&mut a, "chat-message", json!({"email": "b@x.de", "msg": fuellung})).await;

    assert_eq!(registrieren(&mut a, "a@x.de", "A").await, json!([]));
    assert_eq!(hub.state.metriken.frames_rejected_total.get(), 1);
    assert_eq!(hub.state.broadcaster.connection_anzahl(), 1);
}

#[tokio::test]
async fn stummer_client_wird_nach_timeout_getrennt() {
    let config = SignalingConfig {
        keepalive_sek: 1,
        verbindungs_timeout_sek: 2,
        ..SignalingConfig::default()
    };
    let hub = hub_starten(config).await;
    // `a` wird nach der Registrierung nicht mehr gelesen und beantwortet keine Pings
    let mut a = verbinden(hub.addr).await;
    registrieren(&mut a, "a@x.de", "A").await;
    let mut b = verbinden(hub.addr).await;
    let liste = registrieren(&mut b, "b@x.de", "B").await;
    assert_eq!(liste[0]["email"], "a@x.de");

    // `b` liest weiter, dabei gehen Pongs raus
    assert_eq!(
        empfangen(&mut b).await,
        ("user:disconnected".to_string(), json!("a@x.de"))
    );

    let aufgeraeumt = tokio::time::timeout(WARTEZEIT, async {
        while hub.state.broadcaster.connection_anzahl() != 1 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(aufgeraeumt.is_ok(), "Verbindung von a wurde nicht entfernt");
    assert_eq!(hub.state.presence.lock().online_anzahl(), 1);
    drop(a);
}

#[tokio::test]
async fn liveness_endpunkt() {
    let hub = hub_starten(SignalingConfig::default()).await;
    let mut stream = TcpStream::connect(hub.addr).await.expect("TCP verbinden");
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .expect("Anfrage senden");

    let mut antwort = String::new();
    tokio::time::timeout(WARTEZEIT, stream.read_to_string(&mut antwort))
        .await
        .expect("Timeout")
        .expect("Antwort lesen");
    assert!(antwort.starts_with("HTTP/1.1 200"));
    assert!(antwort.ends_with(rendezvous_signaling::ws::LIVENESS_TEXT));
}

#[tokio::test]
async fn shutdown_trennt_und_raeumt_auf() {
    let hub = hub_starten(SignalingConfig::default()).await;
    let mut a = verbinden(hub.addr).await;
    registrieren(&mut a, "a@x.de", "A").await;

    hub.shutdown_tx.send(true).expect("Shutdown senden");

    let ende = tokio::time::timeout(WARTEZEIT, async {
        loop {
            match a.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(ende.is_ok(), "Verbindung wurde nicht getrennt");

    // Cleanup laeuft nach dem Close-Frame im Verbindungs-Task
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(hub.state.presence.lock().online_anzahl(), 0);
    assert_eq!(hub.state.broadcaster.connection_anzahl(), 0);
}
