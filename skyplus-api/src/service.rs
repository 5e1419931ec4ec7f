/// UPnP services exposed by the box that this crate talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// SkyPlay service - playback control and channel changes
    SkyPlay,
}

/// Contains the control path and namespace of a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Control path, relative to the device root
    pub endpoint: &'static str,

    /// Namespace URI used in the `SOAPACTION` header and the action element
    pub service_uri: &'static str,

    /// Path SUBSCRIBE/UNSUBSCRIBE requests are sent to
    pub event_endpoint: &'static str,

    /// Service id embedded in the event callback URL
    pub service_id: &'static str,
}

/// Device UDN the box's own remote-control apps subscribe with
pub const SUBSCRIBER_UUID: &str = "444D5276-3253-6B79-436F-0019fb7d7534";

impl Service {
    pub fn name(&self) -> &'static str {
        match self {
            Service::SkyPlay => "SkyPlay",
        }
    }

    pub fn info(&self) -> ServiceInfo {
        match self {
            Service::SkyPlay => ServiceInfo {
                endpoint: "/SkyPlay2",
                service_uri: "urn:schemas-nds-com:service:SkyPlay:2",
                event_endpoint: "/SkyPlay2",
                service_id: "urn:nds-com:serviceId:SkyPlay2",
            },
        }
    }

    /// Callback URL to register for event notifications from this service
    pub fn callback_url(&self, host: &str, port: u16) -> String {
        format!(
            "http://{}:{}/uuid:{}/{}",
            host,
            port,
            SUBSCRIBER_UUID,
            self.info().service_id
        )
    }
}
