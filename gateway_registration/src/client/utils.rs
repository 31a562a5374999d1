use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Duration;

pub struct Utils;

#[derive(Default, Clone, Debug)]
pub struct ResponseWrap {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ResponseWrap {
    pub fn status_is(&self, status: u16) -> bool {
        self.status == status
    }

    pub fn status_is_2xx(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn get_lossy_string_body(&self) -> Cow<str> {
        String::from_utf8_lossy(&self.body)
    }
}

impl Utils {
    async fn get_response_wrap(resp: reqwest::Response) -> reqwest::Result<ResponseWrap> {
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        Ok(ResponseWrap { status, body })
    }

    /// Sends one request and buffers the whole response.
    ///
    /// Any HTTP status is a successful exchange here; callers decide which
    /// statuses they accept.
    pub async fn request(
        client: &reqwest::Client,
        method_name: &str,
        url: &str,
        body: Vec<u8>,
        headers: Option<&HashMap<String, String>>,
        timeout_millis: Option<u64>,
    ) -> reqwest::Result<ResponseWrap> {
        let mut req_builder = match method_name {
            "GET" => client.get(url),
            "POST" => client.post(url),
            "PUT" => client.put(url),
            "PATCH" => client.patch(url),
            "DELETE" => client.delete(url),
            _ => client.post(url),
        };
        if let Some(headers) = headers {
            for (k, v) in headers.iter() {
                req_builder = req_builder.header(k.as_str(), v.as_str());
            }
        }
        if let Some(timeout) = timeout_millis {
            req_builder = req_builder.timeout(Duration::from_millis(timeout));
        }
        if !body.is_empty() {
            req_builder = req_builder.body(body);
        }
        let res = req_builder.send().await?;
        Self::get_response_wrap(res).await
    }
}

#[cfg(test)]
mod tests {
    use super::ResponseWrap;

    #[test]
    fn test_status_classes() {
        let resp = ResponseWrap {
            status: 201,
            body: b"{}".to_vec(),
        };
        assert!(resp.status_is_2xx());
        assert!(resp.status_is(201));
        assert!(!resp.status_is(200));
        assert_eq!(resp.get_lossy_string_body(), "{}");

        let resp = ResponseWrap {
            status: 404,
            ..Default::default()
        };
        assert!(!resp.status_is_2xx());
        assert_eq!(resp.get_lossy_string_body(), "");
    }
}
