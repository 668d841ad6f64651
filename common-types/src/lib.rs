#[allow(non_snake_case)]
pub mod Collections {
    // Collection names as they appear in the record store.
    pub const MESSAGES: &str = "messages";
    pub const CONSULTATIONS: &str = "consultations";
    // The admin dashboard has historically listed bookings from here,
    // while the booking form writes to CONSULTATIONS.
    pub const BOOKINGS: &str = "bookings";

    // Field the store fills with its own creation time.
    pub const SERVER_TIMESTAMP_FIELD: &str = "timestamp";
}

#[allow(non_snake_case)]
pub mod Consultation {
    use ::std::fmt;
    use ::std::str;
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Service {
        #[serde(rename = "Thesis Guidance")]
        ThesisGuidance,
        #[serde(rename = "Research Paper Help")]
        ResearchPaperHelp,
        #[serde(rename = "Data Analysis")]
        DataAnalysis,
        #[serde(rename = "Editing & Proofreading")]
        EditingAndProofreading,
    }

    impl Service {
        pub const ALL: [Service; 4] = [
            Service::ThesisGuidance,
            Service::ResearchPaperHelp,
            Service::DataAnalysis,
            Service::EditingAndProofreading,
        ];

        pub fn label(&self) -> &'static str {
            match self {
                Service::ThesisGuidance => "Thesis Guidance",
                Service::ResearchPaperHelp => "Research Paper Help",
                Service::DataAnalysis => "Data Analysis",
                Service::EditingAndProofreading => "Editing & Proofreading",
            }
        }
    }

    impl fmt::Display for Service {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{}", self.label())
        }
    }

    impl str::FromStr for Service {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            Service::ALL.into_iter()
                .find(|service| service.label() == s)
                .ok_or_else(|| format!("'{}' is not a valid Service", s))
        }
    }

    #[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub enum Mode {
        #[default]
        Online,
        Offline,
    }

    impl fmt::Display for Mode {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl str::FromStr for Mode {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "Online" => Ok(Mode::Online),
                "Offline" => Ok(Mode::Offline),
                _ => Err(format!("'{}' is not a valid Mode", s)),
            }
        }
    }
}

#[allow(non_snake_case)]
pub mod Ip {
    // Attempt to fetch 'CF-Connecting-IP'
    // Attempt to fetch left-most 'X-Forwarded-For'
    // Attempt to fetch 'X-Real-IP'
    // Attempt to fetch 'Fly-Client-IP'
    // Attempt to fetch 'True-Client-IP'
    //
    // IF DEVELOPMENT
    // Attempt all of above
    // Attempt to fetch 'Host'

    use ::std::net::{Ipv4Addr, Ipv6Addr};
    use axum::http::HeaderMap;

    const HEADERS: [&'static str; 6] = [
        "cf-connecting-ip",
        "x-forwarded-for",
        "x-real-ip",
        "fly-client-ip",
        "true-client-ip",
        "host",
    ];

    fn try_convert_ipv6(data: &str) -> Option<Ipv6Addr> {
        let data = data.trim();
        if let Ok(ipv6) = data.parse::<Ipv6Addr>() {
            return Some(ipv6)
        }
        if let Some((ip_str, _)) = data.split_once(':') {
            if let Ok(ipv4) = ip_str.parse::<Ipv4Addr>() {
                return Some(ipv4.to_ipv6_mapped());
            }
        }
        if let Ok(ipv4) = data.parse::<Ipv4Addr>() {
            return Some(ipv4.to_ipv6_mapped())
        }
        None
    }

    pub fn try_fetch_ipv6(headers: &HeaderMap, development_mode: bool) -> Option<Ipv6Addr> {
        let iterate_up_to = if development_mode { HEADERS.len() } else { HEADERS.len() - 1 };
        for header_name in &HEADERS[..iterate_up_to] {
            let Some(header_value) = headers.get(*header_name) else { continue };
            if *header_name == "x-forwarded-for" {
                if let Ok(str_header_value) = header_value.to_str() {
                    if let Some(left_most_ip) = str_header_value.split(',').next() {
                        if let Some(ipv6) = try_convert_ipv6(left_most_ip) {
                            return Some(ipv6)
                        }
                    }
                }
                continue
            }
            // https://superuser.com/questions/381022/how-many-characters-can-an-ip-address-be
            if header_value.len() > 62 {
                continue
            }
            if let Ok(str_header_value) = header_value.to_str() {
                if let Some(ipv6) = try_convert_ipv6(str_header_value) {
                    return Some(ipv6)
                }
            }
        }
        if development_mode {
            return Some(Ipv6Addr::LOCALHOST)
        }
        None
    }

}
