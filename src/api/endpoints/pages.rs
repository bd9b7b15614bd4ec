//! Self-contained HTML pages (no external resources). Each page talks to
//! the JSON endpoints under `/api/`.

use axum::response::Html;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn find_image_diff() -> Html<&'static str> {
    Html(FIND_DIFF_HTML)
}

pub async fn image_info() -> Html<&'static str> {
    Html(IMAGE_INFO_HTML)
}

pub async fn marked_images() -> Html<&'static str> {
    Html(MARKED_IMAGES_HTML)
}

pub async fn batch_job() -> Html<&'static str> {
    Html(BATCH_JOB_HTML)
}

// ---------------------------------------------------------------------------
// Page sources
// ---------------------------------------------------------------------------

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>ImgDiff</title>
</head>
<body>
  <h1>ImgDiff</h1>
  <ul>
    <li><a href="/findimgdiff">Find image differences</a></li>
    <li><a href="/imageinfo">Image info &amp; marking</a></li>
    <li><a href="/marked_images">Marked images</a></li>
    <li><a href="/batchjob">Batch job</a></li>
  </ul>
</body>
</html>"#;

const FIND_DIFF_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>ImgDiff | Find differences</title>
  <style>
    body { font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 24px; }
    form { display: flex; flex-direction: column; gap: 12px; max-width: 420px; }
    .error { color: #dc2626; }
    canvas { max-width: 100%; border: 1px solid #d6d3d1; }
    #list { max-height: 240px; overflow: auto; font-family: monospace; }
  </style>
</head>
<body>
  <nav><a href="/">Home</a></nav>
  <h1>Find image differences</h1>
  <form id="diff-form">
    <label>Original <input type="file" name="original" accept="image/*" required></label>
    <label>Modified <input type="file" name="modified" accept="image/*" required></label>
    <button type="submit">Compare</button>
  </form>
  <p id="status"></p>
  <canvas id="overlay"></canvas>
  <ol id="list"></ol>
  <script>
    var form = document.getElementById('diff-form');
    var statusEl = document.getElementById('status');
    var listEl = document.getElementById('list');
    var canvas = document.getElementById('overlay');

    form.addEventListener('submit', function(e) {
      e.preventDefault();
      var data = new FormData(form);
      statusEl.textContent = 'Comparing...';
      statusEl.className = '';
      listEl.innerHTML = '';

      fetch('/api/findimgdiff', { method: 'POST', body: data })
        .then(function(res) { return res.json().then(function(body) { return [res.ok, body]; }); })
        .then(function(pair) {
          if (!pair[0]) {
            statusEl.textContent = (pair[1].error && pair[1].error.message) || 'Image comparison failed';
            statusEl.className = 'error';
            return;
          }
          var result = pair[1];
          statusEl.textContent = result.originalFileName + ' vs ' + result.modifiedFileName +
            ': ' + result.differences.length + ' differing pixels';
          result.differences.slice(0, 1000).forEach(function(p) {
            var li = document.createElement('li');
            li.textContent = '(' + p[0] + ', ' + p[1] + ')';
            listEl.appendChild(li);
          });
          drawOverlay(data.get('original'), result.differences);
        })
        .catch(function() {
          statusEl.textContent = 'Failed to send request.';
          statusEl.className = 'error';
        });
    });

    function drawOverlay(file, points) {
      var img = new Image();
      img.onload = function() {
        canvas.width = img.width;
        canvas.height = img.height;
        var ctx = canvas.getContext('2d');
        ctx.drawImage(img, 0, 0);
        ctx.fillStyle = 'rgba(255, 0, 0, 0.8)';
        points.forEach(function(p) { ctx.fillRect(p[0], p[1], 1, 1); });
        URL.revokeObjectURL(img.src);
      };
      img.src = URL.createObjectURL(file);
    }
  </script>
</body>
</html>"#;

const IMAGE_INFO_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>ImgDiff | Image info</title>
</head>
<body>
  <nav><a href="/">Home</a> <a href="/marked_images">Marked images</a></nav>
  <h1>Image info</h1>
  <form id="info-form">
    <input type="file" id="image" accept="image/jpeg,image/png">
    <button type="submit">Get image info</button>
    <label>X <input type="text" id="x" placeholder="150"></label>
    <label>Y <input type="text" id="y" placeholder="150"></label>
    <button type="button" id="mark">Mark image</button>
  </form>
  <p id="error" style="color:#dc2626"></p>
  <pre id="result"></pre>
  <img id="marked" style="max-width:100%">
  <script>
    var fileInput = document.getElementById('image');
    var errorEl = document.getElementById('error');
    var resultEl = document.getElementById('result');
    var markedImg = document.getElementById('marked');

    function selectedImage() {
      var file = fileInput.files[0];
      if (!file) { errorEl.textContent = 'Please select an image first.'; return null; }
      if (['image/jpeg', 'image/png'].indexOf(file.type) < 0) {
        errorEl.textContent = 'Only JPEG and PNG images are allowed.';
        return null;
      }
      return file;
    }

    function send(url, data, onOk) {
      fetch(url, { method: 'POST', body: data })
        .then(function(res) { return res.json().then(function(body) { return [res.ok, body]; }); })
        .then(function(pair) {
          if (pair[0]) { errorEl.textContent = ''; onOk(pair[1]); }
          else { errorEl.textContent = 'Error: ' + ((pair[1].error && pair[1].error.message) || 'Something went wrong'); }
        })
        .catch(function() { errorEl.textContent = 'Failed to send request. Please check your server.'; });
    }

    document.getElementById('info-form').addEventListener('submit', function(e) {
      e.preventDefault();
      var file = selectedImage();
      if (!file) return;
      var data = new FormData();
      data.append('ImageInfo', file);
      send('/api/imageinfo', data, function(info) {
        resultEl.textContent = info.filename + ': ' + info.width + ' x ' + info.height;
      });
    });

    document.getElementById('mark').addEventListener('click', function() {
      var file = selectedImage();
      if (!file) return;
      var x = document.getElementById('x').value || '150';
      var y = document.getElementById('y').value || '150';
      if (isNaN(x) || isNaN(y)) {
        errorEl.textContent = 'Please enter valid numeric values for coordinates.';
        return;
      }
      var data = new FormData();
      data.append('image', file);
      data.append('x', x);
      data.append('y', y);
      send('/api/markimage', data, function(result) {
        resultEl.textContent = result.message;
        markedImg.src = result.url + '?t=' + Date.now();
      });
    });
  </script>
</body>
</html>"#;

const MARKED_IMAGES_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>ImgDiff | Marked images</title>
</head>
<body>
  <nav><a href="/">Home</a> <a href="/imageinfo">Image info</a></nav>
  <h1>Marked images</h1>
  <p id="error" style="color:#dc2626"></p>
  <div id="gallery" style="display:flex;flex-wrap:wrap;gap:16px"></div>
  <script>
    var gallery = document.getElementById('gallery');
    var errorEl = document.getElementById('error');

    function load() {
      fetch('/api/marked_images')
        .then(function(res) { return res.json(); })
        .then(function(body) {
          gallery.innerHTML = '';
          if (body.error) { errorEl.textContent = body.error.message; return; }
          body.images.forEach(function(url) {
            var name = url.split('/').pop();
            var fig = document.createElement('figure');
            var img = document.createElement('img');
            img.src = url;
            img.style.width = '220px';
            var del = document.createElement('button');
            del.textContent = 'Delete ' + decodeURIComponent(name);
            del.onclick = function() { remove(name); };
            fig.appendChild(img);
            fig.appendChild(del);
            gallery.appendChild(fig);
          });
        })
        .catch(function() { errorEl.textContent = 'Failed to load images.'; });
    }

    function remove(name) {
      fetch('/api/marked_images/' + name, { method: 'DELETE' })
        .then(function() { load(); });
    }

    load();
  </script>
</body>
</html>"#;

const BATCH_JOB_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>ImgDiff | Batch job</title>
</head>
<body>
  <nav><a href="/">Home</a></nav>
  <h1>Batch Job</h1>
  <div id="idle"><button id="start">Start batch job</button></div>
  <div id="running" style="display:none">
    <p id="started"></p>
    <p id="count"></p>
    <button id="stop">Stop batch job</button>
  </div>
  <script>
    var timer = null;
    var executions = 0;

    function call(method) {
      return fetch('/api/batchjob', { method: method }).then(function(res) { return res.json(); });
    }

    function render(running) {
      document.getElementById('idle').style.display = running ? 'none' : 'block';
      document.getElementById('running').style.display = running ? 'block' : 'none';
      document.getElementById('count').textContent = 'Executions so far: ' + executions;
    }

    document.getElementById('start').addEventListener('click', function() {
      call('POST').then(function() {
        executions = 0;
        document.getElementById('started').textContent = 'Started at ' + new Date().toLocaleString();
        render(true);
        timer = setInterval(function() {
          call('POST').then(function() { executions += 1; render(true); })
            .catch(function(err) { console.error('Batch job failed:', err); });
        }, 5000);
      });
    });

    document.getElementById('stop').addEventListener('click', function() {
      call('DELETE').then(function() {
        clearInterval(timer);
        timer = null;
        render(false);
      });
    });

    window.addEventListener('beforeunload', function() { clearInterval(timer); });
  </script>
</body>
</html>"#;
